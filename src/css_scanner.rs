use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::downloader::Downloader;
use crate::mirror::MirrorReport;
use crate::url_resolver::resolve;

static CSS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(["']?(.*?)["']?\)"#).expect("hardcoded regex pattern is valid")
});

fn clean_reference(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
}

/// Every `url(...)` reference in `css`, unquoted, in order of appearance.
/// Duplicates are kept.
pub fn extract_urls(css: &str) -> Vec<String> {
    CSS_URL_REGEX
        .captures_iter(css)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_reference(m.as_str()))
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// The first `url(...)` reference in an attribute or inline style value.
pub fn extract_first_url(text: &str) -> Option<String> {
    CSS_URL_REGEX
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_reference(m.as_str()))
        .find(|r| !r.is_empty())
        .map(str::to_string)
}

pub fn is_data_uri(reference: &str) -> bool {
    reference
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Saves the stylesheet at `css_url`, then fetches every asset it references.
///
/// References resolve against the stylesheet's own URL. A failed asset does
/// not stop the remaining ones.
pub async fn process_stylesheet(downloader: &Downloader, css_url: &Url, report: &mut MirrorReport) {
    let Some(css_path) = downloader.fetch_asset(css_url, report).await else {
        return;
    };

    let css = match downloader.files().read_to_string(&css_path) {
        Ok(css) => css,
        Err(e) => {
            debug!(path = %css_path, error = %e, "could not re-read saved stylesheet");
            return;
        }
    };

    let references = extract_urls(&css);
    if references.is_empty() {
        debug!(stylesheet = %css_url, "no url() references");
    }

    for reference in references {
        if is_data_uri(&reference) {
            debug!(stylesheet = %css_url, "skipping inline data URI");
            continue;
        }
        if let Some(asset_url) = resolve(css_url, &reference) {
            downloader.fetch_asset(&asset_url, report).await;
        }
    }
}
