//! End-to-end scrape of one page.
//!
//! A run moves through fixed stages: check robots.txt, fetch the page,
//! extract candidates, build the filter chain, run the download loop, and
//! report. Every stage before the download loop can end the run with a
//! [`ScrapeError`]; failures inside the loop are recorded in the report.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::download::constants::{
    DEFAULT_DELAY, DEFAULT_MAX_IMAGES, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS,
};
use crate::download::{
    AllowAll, DownloadEngine, DownloadObserver, FetchError, FilesystemError, HttpClient,
    HttpRobotsPolicy, RobotsDecision, RobotsPolicy, parse_http_url,
};
use crate::filter::{DimensionProbe, FilterChain, default_probe};
use crate::parser::{ImageCandidate, extract_candidates};
use crate::report::ScrapeReport;
use crate::user_agent::default_user_agent;

/// Errors that end a run before or outside the download loop.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// An option is out of range.
    #[error("invalid option {name}: {reason}")]
    InvalidOption {
        name: &'static str,
        reason: String,
    },

    /// The target page could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// robots.txt disallows the target URL.
    #[error("robots.txt disallows {url}")]
    RobotsDenied { url: String },

    /// The output directory could not be prepared.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

impl ScrapeError {
    fn invalid_option(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub url: String,
    pub output_dir: PathBuf,
    pub max_images: usize,
    pub delay: Duration,
    pub timeout: Duration,
    pub same_domain: bool,
    pub min_width: u32,
    pub min_height: u32,
    pub check_robots: bool,
    /// Overrides the default User-Agent.
    pub user_agent: Option<String>,
}

impl ScrapeOptions {
    /// Options for `url` with every other setting at its default.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_images: DEFAULT_MAX_IMAGES,
            delay: DEFAULT_DELAY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            same_domain: false,
            min_width: 0,
            min_height: 0,
            check_robots: true,
            user_agent: None,
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidOption`] for a zero `max_images`, a zero
    /// timeout, or a blank User-Agent override.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.max_images == 0 {
            return Err(ScrapeError::invalid_option("max", "must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(ScrapeError::invalid_option("timeout", "must be greater than 0"));
        }
        if self
            .user_agent
            .as_deref()
            .is_some_and(|ua| ua.trim().is_empty())
        {
            return Err(ScrapeError::invalid_option("user-agent", "must not be empty"));
        }
        Ok(())
    }
}

/// One configured scrape, ready to run.
#[derive(Debug)]
pub struct Scraper {
    options: ScrapeOptions,
    client: HttpClient,
    robots: Box<dyn RobotsPolicy>,
    probe: Option<Box<dyn DimensionProbe>>,
}

impl Scraper {
    /// Builds the HTTP client and default collaborators for `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidOption`] for out-of-range options and
    /// [`ScrapeError::Fetch`] if the HTTP client cannot be built.
    pub fn new(options: ScrapeOptions) -> Result<Self, ScrapeError> {
        options.validate()?;
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(default_user_agent);
        let client = HttpClient::with_user_agent(options.timeout, &user_agent)?;

        let robots: Box<dyn RobotsPolicy> = if options.check_robots {
            Box::new(HttpRobotsPolicy::new(client.clone()))
        } else {
            Box::new(AllowAll)
        };

        Ok(Self {
            options,
            client,
            robots,
            probe: default_probe(),
        })
    }

    /// Replaces the robots.txt policy.
    #[must_use]
    pub fn with_robots_policy(mut self, robots: Box<dyn RobotsPolicy>) -> Self {
        self.robots = robots;
        self
    }

    /// Replaces the image dimension probe. `None` disables size filtering.
    #[must_use]
    pub fn with_dimension_probe(mut self, probe: Option<Box<dyn DimensionProbe>>) -> Self {
        self.probe = probe;
        self
    }

    /// Runs the scrape.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Fetch`] if the URL is invalid or the page cannot be fetched
    /// - [`ScrapeError::RobotsDenied`] if robots.txt disallows the page
    /// - [`ScrapeError::Filesystem`] if the output directory cannot be prepared
    #[instrument(skip_all, fields(url = %self.options.url))]
    pub async fn run(self, observer: &mut dyn DownloadObserver) -> Result<ScrapeReport, ScrapeError> {
        let Self {
            options,
            client,
            robots,
            probe,
        } = self;

        let target = parse_http_url(&options.url)?;

        if robots.check(&target).await == RobotsDecision::Disallowed {
            return Err(ScrapeError::RobotsDenied {
                url: target.to_string(),
            });
        }

        let page = client.fetch_page(target.as_str()).await?;
        info!(url = %page.url, status = page.status, "fetched page");

        let candidates: Vec<ImageCandidate> = extract_candidates(&page.html, &page.url).collect();
        info!(candidates = candidates.len(), "extracted image candidates");
        let candidate_count = candidates.len();

        let mut filters = FilterChain::new();
        if options.same_domain {
            filters = filters.with_same_domain(&page.url);
        }
        filters = filters.with_dimensions(options.min_width, options.min_height, probe);
        debug!(
            same_domain = filters.filters_domain(),
            dimensions = filters.needs_bytes(),
            "filters configured"
        );

        let engine = DownloadEngine::new(&options.output_dir, options.max_images, options.delay);
        let download = engine.run(candidates, &client, &filters, observer).await?;

        Ok(ScrapeReport {
            page_url: page.url,
            output_dir: engine.output_dir().to_path_buf(),
            candidates: candidate_count,
            robots_checked: options.check_robots,
            download,
        })
    }
}
