use tracing::debug;
use url::Url;

/// File name used when a URL path is empty or names a directory.
pub const INDEX_FILE: &str = "index.html";

/// Joins `reference` against `base` the way a browser would.
///
/// Absolute, scheme-relative (`//host/x`) and relative references are all
/// accepted. Returns `None` for blank references, references that do not
/// parse, and anything that lands outside `http`/`https`.
pub fn resolve(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let resolved = match base.join(reference) {
        Ok(url) => url,
        Err(e) => {
            debug!(base = %base, reference, error = %e, "unresolvable reference");
            return None;
        }
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        scheme => {
            debug!(reference, scheme, "skipping non-http reference");
            None
        }
    }
}

/// Key used for the visited set: the URL with any fragment dropped.
pub fn normalize_page_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Maps URLs to paths relative to the mirror root.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    strip_prefix: Option<String>,
}

impl PathMapper {
    pub fn new(strip_prefix: Option<&str>) -> Self {
        let strip_prefix = strip_prefix
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}/", p));

        Self { strip_prefix }
    }

    /// Relative path for `url`: the URL path without leading slashes and
    /// without the configured prefix, with `index.html` standing in for an
    /// empty path.
    pub fn to_relative_path(&self, url: &Url) -> String {
        let mut path = url.path().trim_start_matches('/');

        if let Some(prefix) = &self.strip_prefix {
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                path = rest;
            }
        }

        if path.is_empty() {
            INDEX_FILE.to_string()
        } else {
            path.to_string()
        }
    }

    /// Where an HTML page is saved. Directory-style page URLs (`/docs/`) get
    /// `index.html` appended; assets never do.
    pub fn page_path(&self, url: &Url) -> String {
        let path = self.to_relative_path(url);
        if path.ends_with('/') {
            format!("{}{}", path, INDEX_FILE)
        } else {
            path
        }
    }
}
