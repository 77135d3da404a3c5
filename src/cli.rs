use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::{LinkScope, MirrorConfig};

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    about = "A CLI utility to mirror a website to local disk",
    version,
    long_about = "Recursively downloads a website's HTML pages together with their stylesheets, scripts and images, keeping the site's path layout. Image and background references are rewritten to the local copies."
)]
pub struct MirrorCommand {
    /// The URL of the website to mirror
    #[arg(env = "SCRAPE_URL", default_value = "https://your-website.com")]
    pub url: String,

    /// Output directory for the mirrored website
    #[arg(short, long, env = "SCRAPE_DIR", default_value = "website_content")]
    pub output_dir: PathBuf,

    /// Leading path segment removed from saved paths (e.g. "foores/")
    #[arg(long, env = "SCRAPE_STRIP_PREFIX")]
    pub strip_prefix: Option<String>,

    /// Maximum link depth to follow from the root page (0 = unlimited)
    #[arg(short = 'd', long, default_value = "0")]
    pub max_depth: usize,

    /// Only follow page links with the root URL's scheme, host and port
    #[arg(long)]
    pub same_origin: bool,

    /// User agent string to use for requests
    #[arg(long, default_value = crate::config::DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Timeout for each request in seconds
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Print debug diagnostics to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl MirrorCommand {
    pub fn into_config(self) -> Result<MirrorConfig> {
        let root_url = Url::parse(&self.url)
            .with_context(|| format!("Failed to parse URL: {}", self.url))?;
        if !matches!(root_url.scheme(), "http" | "https") {
            bail!("Unsupported URL scheme {:?}: only http and https can be mirrored", root_url.scheme());
        }

        let link_scope = if self.same_origin {
            LinkScope::SameOrigin
        } else {
            LinkScope::Any
        };

        Ok(MirrorConfig {
            root_url,
            output_dir: self.output_dir,
            strip_prefix: self.strip_prefix,
            max_depth: self.max_depth,
            link_scope,
            user_agent: self.user_agent,
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_args() {
        let args = MirrorCommand::try_parse_from([
            "site-mirror",
            "https://example.com",
            "-o", "./output",
        ])
        .unwrap();

        assert_eq!(args.url, "https://example.com");
        assert_eq!(args.output_dir, PathBuf::from("./output"));
        assert_eq!(args.max_depth, 0);
        assert_eq!(args.timeout, 10);
        assert_eq!(args.user_agent, "Mozilla/5.0");
        assert_eq!(args.strip_prefix, None);
        assert!(!args.same_origin);
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_all_args() {
        let args = MirrorCommand::try_parse_from([
            "site-mirror",
            "https://example.com/start/",
            "-o", "./output",
            "-d", "4",
            "--strip-prefix", "foores/",
            "--same-origin",
            "--user-agent", "Test/1.0",
            "--timeout", "3",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.max_depth, 4);
        assert_eq!(args.strip_prefix.as_deref(), Some("foores/"));
        assert!(args.same_origin);
        assert!(args.verbose);

        let config = args.into_config().unwrap();
        assert_eq!(config.root_url.as_str(), "https://example.com/start/");
        assert_eq!(config.link_scope, LinkScope::SameOrigin);
        assert_eq!(config.user_agent, "Test/1.0");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_parse_zero_timeout() {
        let result = MirrorCommand::try_parse_from([
            "site-mirror",
            "https://example.com",
            "--timeout", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_url() {
        let args = MirrorCommand::try_parse_from(["site-mirror", "not a url"]).unwrap();
        assert!(args.into_config().is_err());

        let args = MirrorCommand::try_parse_from(["site-mirror", "ftp://example.com/"]).unwrap();
        assert!(args.into_config().is_err());
    }
}
