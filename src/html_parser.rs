use anyhow::{Context, Result};
use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use tracing::debug;
use url::Url;

use crate::css_scanner::{extract_first_url, process_stylesheet};
use crate::downloader::Downloader;
use crate::mirror::MirrorReport;
use crate::url_resolver::resolve;

/// Attributes on `<img>` and favicon links that are fetched and rewritten.
pub const IMAGE_ATTRS: [&str; 2] = ["src", "data-src"];

/// Lazy-loading attributes that carry a `url(...)` background.
pub const BACKGROUND_ATTRS: [&str; 3] = ["data-bg", "data-original", "data-background"];

/// A parsed, mutable HTML document.
pub struct HtmlDocument {
    dom: RcDom,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .context("Failed to parse HTML document")?;

        Ok(Self { dom })
    }

    /// All elements in document order.
    pub fn elements(&self) -> Vec<Handle> {
        let mut elements = Vec::new();
        let mut stack = vec![self.dom.document.clone()];

        while let Some(node) = stack.pop() {
            if let NodeData::Element { .. } = node.data {
                elements.push(node.clone());
            }
            for child in node.children.borrow().iter().rev() {
                stack.push(child.clone());
            }
        }

        elements
    }

    pub fn serialize(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };

        serialize(
            &mut buffer,
            &SerializableHandle::from(self.dom.document.clone()),
            opts,
        )
        .context("Failed to serialize HTML document")?;

        String::from_utf8(buffer).context("Serialized HTML is not UTF-8")
    }
}

pub fn tag_name(handle: &Handle) -> Option<&str> {
    match handle.data {
        NodeData::Element { ref name, .. } => Some(&*name.local),
        _ => None,
    }
}

pub fn get_attr(handle: &Handle, name: &str) -> Option<String> {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// Replaces the value of an existing attribute. Returns false if the element
/// has no such attribute.
pub fn set_attr(handle: &Handle, name: &str, value: &str) -> bool {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        if let Some(attr) = attrs
            .borrow_mut()
            .iter_mut()
            .find(|attr| &*attr.name.local == name)
        {
            attr.value = StrTendril::from_slice(value);
            return true;
        }
    }
    false
}

fn rel_tokens(handle: &Handle) -> Vec<String> {
    get_attr(handle, "rel")
        .map(|rel| rel.split_whitespace().map(str::to_ascii_lowercase).collect())
        .unwrap_or_default()
}

pub fn is_stylesheet_link(handle: &Handle) -> bool {
    tag_name(handle) == Some("link") && rel_tokens(handle).iter().any(|t| t == "stylesheet")
}

pub fn is_script_with_src(handle: &Handle) -> bool {
    tag_name(handle) == Some("script") && get_attr(handle, "src").is_some()
}

/// `<img>` elements and `<link>` elements whose rel mentions "icon".
pub fn is_image_bearing(handle: &Handle) -> bool {
    match tag_name(handle) {
        Some("img") => true,
        Some("link") => rel_tokens(handle).iter().any(|t| t.contains("icon")),
        _ => false,
    }
}

/// Whether an anchor's href names another page to mirror.
/// Points `<meta charset>` and `<meta http-equiv="content-type">` at UTF-8,
/// the encoding pages are saved in.
pub fn declare_utf8(elements: &[Handle]) {
    for meta in elements.iter().filter(|el| tag_name(el) == Some("meta")) {
        if get_attr(meta, "charset").is_some() {
            set_attr(meta, "charset", "utf-8");
        }
        let is_content_type = get_attr(meta, "http-equiv")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"));
        if is_content_type {
            set_attr(meta, "content", "text/html; charset=utf-8");
        }
    }
}

pub fn is_page_href(href: &str) -> bool {
    href.ends_with(".html") || href.ends_with('/')
}

/// Page links of a document, resolved against `page_url`, in document order.
pub fn page_links(elements: &[Handle], page_url: &Url) -> Vec<Url> {
    elements
        .iter()
        .filter(|el| tag_name(el) == Some("a"))
        .filter_map(|el| get_attr(el, "href"))
        .filter(|href| is_page_href(href))
        .filter_map(|href| resolve(page_url, &href))
        .collect()
}

/// A processed page: the rewritten markup and the page links it contains.
#[derive(Debug)]
pub struct PageResult {
    pub html: String,
    pub links: Vec<Url>,
}

/// Mirrors the assets of one page and rewrites image references in it.
pub struct PageProcessor<'a> {
    downloader: &'a Downloader,
    page_url: &'a Url,
}

impl<'a> PageProcessor<'a> {
    pub fn new(downloader: &'a Downloader, page_url: &'a Url) -> Self {
        Self {
            downloader,
            page_url,
        }
    }

    /// Fetches every stylesheet, script, image and background the page
    /// references, rewrites image and background attributes that were saved,
    /// and returns the serialized page with its page links.
    ///
    /// Stylesheet `href` and script `src` keep their remote values.
    pub async fn process(&self, html: &str, report: &mut MirrorReport) -> Result<PageResult> {
        let document = HtmlDocument::parse(html)?;
        let elements = document.elements();

        for link in elements.iter().filter(|el| is_stylesheet_link(el)) {
            if let Some(css_url) = get_attr(link, "href").and_then(|href| resolve(self.page_url, &href)) {
                process_stylesheet(self.downloader, &css_url, report).await;
            }
        }

        for script in elements.iter().filter(|el| is_script_with_src(el)) {
            if let Some(js_url) = get_attr(script, "src").and_then(|src| resolve(self.page_url, &src)) {
                self.downloader.fetch_asset(&js_url, report).await;
            }
        }

        for image in elements.iter().filter(|el| is_image_bearing(el)) {
            for attr in IMAGE_ATTRS {
                self.mirror_image_attr(image, attr, report).await;
            }
        }

        for element in &elements {
            for attr in BACKGROUND_ATTRS {
                self.mirror_background_attr(element, attr, report).await;
            }
            self.mirror_inline_style(element, report).await;
        }

        let links = page_links(&elements, self.page_url);
        declare_utf8(&elements);
        let html = document.serialize()?;

        Ok(PageResult { html, links })
    }

    async fn mirror_image_attr(&self, element: &Handle, attr: &str, report: &mut MirrorReport) {
        let Some(value) = get_attr(element, attr) else {
            return;
        };
        let Some(url) = resolve(self.page_url, &value) else {
            return;
        };
        if let Some(relative_path) = self.downloader.fetch_asset(&url, report).await {
            set_attr(element, attr, &relative_path);
        }
    }

    async fn mirror_background_attr(&self, element: &Handle, attr: &str, report: &mut MirrorReport) {
        let Some(value) = get_attr(element, attr) else {
            return;
        };
        let Some(reference) = extract_first_url(&value) else {
            debug!(attr, value = %value, "no url() in background attribute");
            return;
        };
        let Some(url) = resolve(self.page_url, &reference) else {
            return;
        };
        if let Some(relative_path) = self.downloader.fetch_asset(&url, report).await {
            set_attr(element, attr, &format!("url('{}')", relative_path));
        }
    }

    async fn mirror_inline_style(&self, element: &Handle, report: &mut MirrorReport) {
        let Some(style) = get_attr(element, "style") else {
            return;
        };
        let Some(reference) = extract_first_url(&style) else {
            return;
        };
        let Some(url) = resolve(self.page_url, &reference) else {
            return;
        };
        if let Some(relative_path) = self.downloader.fetch_asset(&url, report).await {
            set_attr(element, "style", &style.replace(&reference, &relative_path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'d>(elements: &'d [Handle], tag: &str) -> Vec<&'d Handle> {
        elements.iter().filter(|el| tag_name(el) == Some(tag)).collect()
    }

    #[test]
    fn test_elements_in_document_order() {
        let doc = HtmlDocument::parse("<p id=a><span id=b></span></p><p id=c></p>").unwrap();
        let ids: Vec<String> = doc
            .elements()
            .iter()
            .filter_map(|el| get_attr(el, "id"))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_link_classification() {
        let doc = HtmlDocument::parse(
            r#"<head>
                <link rel="stylesheet" href="/a.css">
                <link rel="Alternate StyleSheet" href="/b.css">
                <link rel="preload" href="/c.css">
                <link rel="shortcut icon" src="/favicon.ico">
                <link rel="apple-touch-icon" data-src="/touch.png">
                <script src="/app.js"></script>
                <script>inline()</script>
            </head>"#,
        )
        .unwrap();
        let elements = doc.elements();

        let stylesheets: Vec<String> = elements
            .iter()
            .filter(|el| is_stylesheet_link(el))
            .filter_map(|el| get_attr(el, "href"))
            .collect();
        assert_eq!(stylesheets, vec!["/a.css", "/b.css"]);

        let icons = elements.iter().filter(|el| is_image_bearing(el)).count();
        assert_eq!(icons, 2);

        let scripts = elements.iter().filter(|el| is_script_with_src(el)).count();
        assert_eq!(scripts, 1);
    }

    #[test]
    fn test_page_links() {
        let doc = HtmlDocument::parse(
            r##"<a href="/about.html">About</a>
               <a href="blog/">Blog</a>
               <a href="/file.pdf">PDF</a>
               <a href="#top">Top</a>
               <a href="mailto:x@example.com/">Mail</a>
               <a>No href</a>"##,
        )
        .unwrap();
        let base = Url::parse("https://example.com/docs/index.html").unwrap();
        let links: Vec<String> = page_links(&doc.elements(), &base)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec!["https://example.com/about.html", "https://example.com/docs/blog/"]
        );
    }

    #[test]
    fn test_set_attr_and_serialize() {
        let doc = HtmlDocument::parse(
            r#"<html><body><img src="https://cdn.example.com/a.png" alt="x"><div style="color: red"></div></body></html>"#,
        )
        .unwrap();
        let elements = doc.elements();

        let img = find(&elements, "img")[0];
        assert!(set_attr(img, "src", "img/a.png"));
        assert!(!set_attr(img, "data-src", "img/a.png"));

        let html = doc.serialize().unwrap();
        assert!(html.contains(r#"<img src="img/a.png" alt="x">"#));
        assert!(!html.contains("cdn.example.com"));
        assert!(!html.contains("data-src"));
    }

    #[test]
    fn test_serialize_keeps_doctype() {
        let doc = HtmlDocument::parse("<!DOCTYPE html><title>t</title>").unwrap();
        let html = doc.serialize().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>t</title>"));
    }

    #[test]
    fn test_declare_utf8_rewrites_meta_charsets() {
        let doc = HtmlDocument::parse(
            r#"<html><head><meta charset="ISO-8859-1"><meta http-equiv="Content-Type" content="text/html; charset=windows-1252"><meta name="viewport" content="width=device-width"></head></html>"#,
        )
        .unwrap();
        let elements = doc.elements();
        declare_utf8(&elements);

        let metas = find(&elements, "meta");
        assert_eq!(get_attr(metas[0], "charset").as_deref(), Some("utf-8"));
        assert_eq!(
            get_attr(metas[1], "content").as_deref(),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(
            get_attr(metas[2], "content").as_deref(),
            Some("width=device-width")
        );
    }

    #[test]
    fn test_is_page_href() {
        assert!(is_page_href("/about.html"));
        assert!(is_page_href("https://example.com/"));
        assert!(!is_page_href("/about.htm"));
        assert!(!is_page_href("/about.html#team"));
    }
}
