pub mod cli;
pub mod config;
pub mod css_scanner;
pub mod downloader;
pub mod error;
pub mod file_manager;
pub mod html_parser;
pub mod logging;
pub mod mirror;
pub mod progress;
pub mod url_resolver;

// Re-export main types for convenience
pub use cli::MirrorCommand;
pub use config::{LinkScope, MirrorConfig};
pub use downloader::Downloader;
pub use error::{DownloadOutcome, FetchError};
pub use file_manager::FileManager;
pub use html_parser::{HtmlDocument, PageProcessor, PageResult};
pub use mirror::{CrawlState, MirrorReport, WebsiteMirror};
pub use progress::Reporter;
pub use url_resolver::{resolve, PathMapper};
