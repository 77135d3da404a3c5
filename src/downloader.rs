use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder, Response};
use url::Url;

use crate::config::MirrorConfig;
use crate::error::{DownloadOutcome, FetchError};
use crate::file_manager::FileManager;
use crate::mirror::MirrorReport;
use crate::progress::Reporter;
use crate::url_resolver::PathMapper;

/// The fetch session of one mirror run: an HTTP client plus the mirror root
/// it saves into.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    file_manager: FileManager,
    paths: PathMapper,
    reporter: Reporter,
}

impl Downloader {
    pub fn new(config: &MirrorConfig, reporter: Reporter) -> Result<Self> {
        let client = Self::build_http_client(config)?;
        let file_manager = FileManager::new(&config.output_dir)?;
        let paths = PathMapper::new(config.strip_prefix.as_deref());

        Ok(Self {
            client,
            file_manager,
            paths,
            reporter,
        })
    }

    fn build_http_client(config: &MirrorConfig) -> Result<Client> {
        let client = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(client)
    }

    pub fn files(&self) -> &FileManager {
        &self.file_manager
    }

    pub fn paths(&self) -> &PathMapper {
        &self.paths
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response)
    }

    /// GETs `url` and writes the body verbatim to `relative_path` under the
    /// mirror root. Failures are reported and returned, never raised.
    pub async fn fetch(&self, url: &Url, relative_path: &str) -> DownloadOutcome {
        let outcome = match self.get(url).await {
            Ok(response) => response.bytes().await.map_err(FetchError::from),
            Err(e) => Err(e),
        };
        let outcome = match outcome {
            Ok(body) => self
                .file_manager
                .save_file(relative_path, &body)
                .map_err(|e| FetchError::storage(self.file_manager.local_path(relative_path), e)),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(_) => self.reporter.downloaded(relative_path),
            Err(e) => self.reporter.download_failed(url.as_str(), e),
        }
        outcome
    }

    /// Derives the relative path for `url`, fetches it and tallies the result.
    /// Returns the relative path only when the file was saved.
    pub async fn fetch_asset(&self, url: &Url, report: &mut MirrorReport) -> Option<String> {
        let relative_path = self.paths.to_relative_path(url);
        match self.fetch(url, &relative_path).await {
            Ok(_) => {
                report.assets_downloaded += 1;
                Some(relative_path)
            }
            Err(_) => {
                report.assets_failed += 1;
                None
            }
        }
    }

    /// GETs an HTML page and returns its body decoded with the charset from
    /// its Content-Type (UTF-8 when none is given). Nothing is written.
    pub async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }
}
