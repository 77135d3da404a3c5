use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single page or asset could not be mirrored.
///
/// Every variant is reported to the operator through the same failure line;
/// the distinction is kept for callers that want to tell them apart.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection error, timeout, or a body that could not be read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(StatusCode),

    /// The body arrived but could not be written below the mirror root.
    #[error("could not write {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

/// Result of one fetch attempt: the absolute path of the saved file on success.
pub type DownloadOutcome = Result<PathBuf, FetchError>;
