use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which discovered page links are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkScope {
    /// Every `.html` or `/` link, wherever it points.
    #[default]
    Any,
    /// Only links sharing the root URL's scheme, host and port.
    SameOrigin,
}

/// Settings for one mirror run.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub root_url: Url,
    pub output_dir: PathBuf,
    pub strip_prefix: Option<String>,
    /// Deepest link level followed from the root page; 0 means unlimited.
    pub max_depth: usize,
    pub link_scope: LinkScope,
    pub user_agent: String,
    pub timeout: Duration,
}

impl MirrorConfig {
    pub fn new(root_url: Url, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_url,
            output_dir: output_dir.into(),
            strip_prefix: None,
            max_depth: 0,
            link_scope: LinkScope::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_link_scope(mut self, link_scope: LinkScope) -> Self {
        self.link_scope = link_scope;
        self
    }

    /// Whether a page link found at `depth - 1` may be visited at `depth`.
    pub fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth == 0 || depth <= self.max_depth
    }

    pub fn allows_link(&self, url: &Url) -> bool {
        match self.link_scope {
            LinkScope::Any => true,
            LinkScope::SameOrigin => url.origin() == self.root_url.origin(),
        }
    }
}
