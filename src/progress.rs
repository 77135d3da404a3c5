use std::fmt::Display;
use std::path::Path;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::mirror::MirrorReport;

/// Operator-facing console output.
///
/// Lines go to stdout around an optional spinner that names the page being
/// mirrored. Cloning shares the same spinner.
#[derive(Clone)]
pub struct Reporter {
    spinner: ProgressBar,
}

impl Reporter {
    /// Console reporter with a spinner (hidden automatically when stderr is
    /// not a terminal).
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        Self { spinner }
    }

    /// Reporter that prints lines but never draws a spinner.
    pub fn plain() -> Self {
        Self {
            spinner: ProgressBar::hidden(),
        }
    }

    fn line(&self, text: String) {
        self.spinner.suspend(|| println!("{}", text));
    }

    pub fn started(&self, url: &str, output_dir: &Path) {
        self.line(format!("Starting to scrape website: {}", url.blue()));
        self.line(format!("Output directory: {:?}", output_dir));
    }

    pub fn visiting(&self, url: &str) {
        self.spinner.set_message(format!("Mirroring: {}", url));
        self.spinner.tick();
    }

    pub fn downloaded(&self, relative_path: &str) {
        self.line(format!("{} {}", "Downloaded:".green(), relative_path));
    }

    pub fn download_failed(&self, url: &str, error: &dyn Display) {
        self.line(format!(
            "{} {}. Error: {}",
            "Failed to download".red(),
            url,
            error
        ));
    }

    pub fn page_failed(&self, url: &str, error: &dyn Display) {
        self.line(format!(
            "{} {}. Error: {}",
            "Failed to retrieve the webpage".red(),
            url,
            error
        ));
    }

    pub fn page_saved(&self, path: &Path) {
        self.line(format!("{} {}", "Saved HTML to".green(), path.display()));
    }

    pub fn completed(&self, report: &MirrorReport) {
        self.spinner.finish_and_clear();
        self.line(format!("{}", "Scraping completed.".green().bold()));
        self.line(format!(
            "Pages saved: {}, pages failed: {}, assets downloaded: {}, assets failed: {}",
            report.pages_written, report.pages_failed, report.assets_downloaded, report.assets_failed
        ));
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}
