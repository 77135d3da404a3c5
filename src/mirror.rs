use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

use crate::config::MirrorConfig;
use crate::downloader::Downloader;
use crate::html_parser::PageProcessor;
use crate::progress::Reporter;
use crate::url_resolver::normalize_page_url;

/// Counts collected over one mirror run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub pages_written: usize,
    pub pages_failed: usize,
    pub assets_downloaded: usize,
    pub assets_failed: usize,
}

#[derive(Debug)]
enum Step {
    Visit { url: Url, depth: usize },
    Write { path: String, html: String },
}

/// Traversal state of one run: pages already scheduled and the pending steps.
///
/// A page's `Write` step sits below the `Visit` steps of its links, so the
/// page is written only after every page reachable through it was handled.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: HashSet<String>,
    stack: Vec<Step>,
}

impl CrawlState {
    pub fn new(root: Url) -> Self {
        Self {
            visited: HashSet::new(),
            stack: vec![Step::Visit {
                url: root,
                depth: 0,
            }],
        }
    }

    /// Records `url` as visited. Returns false if it already was.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(normalize_page_url(url).into())
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(normalize_page_url(url).as_str())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    fn pop(&mut self) -> Option<Step> {
        self.stack.pop()
    }

    /// Queues the page's write, then its links so the first link runs next.
    fn schedule(&mut self, path: String, html: String, links: Vec<Url>, depth: usize) {
        self.stack.push(Step::Write { path, html });
        for url in links.into_iter().rev() {
            self.stack.push(Step::Visit {
                url,
                depth: depth + 1,
            });
        }
    }
}

pub struct WebsiteMirror {
    config: MirrorConfig,
    downloader: Downloader,
    reporter: Reporter,
}

impl WebsiteMirror {
    pub fn new(config: MirrorConfig) -> Result<Self> {
        Self::with_reporter(config, Reporter::new())
    }

    pub fn with_reporter(config: MirrorConfig, reporter: Reporter) -> Result<Self> {
        let downloader = Downloader::new(&config, reporter.clone())?;

        Ok(Self {
            config,
            downloader,
            reporter,
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        self.downloader.files().base_dir().to_path_buf()
    }

    /// Mirrors every page reachable from the root URL, each at most once.
    pub async fn mirror_website(&self) -> Result<MirrorReport> {
        let root = self.config.root_url.clone();
        self.reporter.started(root.as_str(), &self.output_dir());

        let mut state = CrawlState::new(root);
        let mut report = MirrorReport::default();

        while let Some(step) = state.pop() {
            match step {
                Step::Visit { url, depth } => {
                    self.visit_page(&mut state, &mut report, url, depth).await?;
                }
                Step::Write { path, html } => self.write_page(&mut report, &path, &html),
            }
        }

        debug!(pages = state.visited_count(), "traversal finished");
        self.reporter.completed(&report);
        Ok(report)
    }

    async fn visit_page(
        &self,
        state: &mut CrawlState,
        report: &mut MirrorReport,
        url: Url,
        depth: usize,
    ) -> Result<()> {
        if !state.mark_visited(&url) {
            return Ok(());
        }
        self.reporter.visiting(url.as_str());

        let body = match self.downloader.fetch_page(&url).await {
            Ok(body) => body,
            Err(e) => {
                self.reporter.page_failed(url.as_str(), &e);
                report.pages_failed += 1;
                return Ok(());
            }
        };

        let page = PageProcessor::new(&self.downloader, &url)
            .process(&body, report)
            .await?;

        let links = page
            .links
            .into_iter()
            .filter(|link| self.should_follow(&*state, link, depth + 1))
            .collect();

        let path = self.downloader.paths().page_path(&url);
        state.schedule(path, page.html, links, depth);
        Ok(())
    }

    fn should_follow(&self, state: &CrawlState, link: &Url, depth: usize) -> bool {
        if state.is_visited(link) {
            return false;
        }
        if !self.config.allows_depth(depth) {
            debug!(link = %link, depth, "beyond max depth");
            return false;
        }
        if !self.config.allows_link(link) {
            debug!(link = %link, "off-origin page link");
            return false;
        }
        true
    }

    fn write_page(&self, report: &mut MirrorReport, path: &str, html: &str) {
        match self.downloader.files().save_file(path, html.as_bytes()) {
            Ok(saved) => {
                self.reporter.page_saved(&saved);
                report.pages_written += 1;
            }
            Err(e) => {
                self.reporter.page_failed(path, &e);
                report.pages_failed += 1;
            }
        }
    }
}
