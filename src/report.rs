//! Run reports.
//!
//! [`DownloadReport`] is what the download loop produces; [`ScrapeReport`]
//! wraps it with the page-level context. Both serialize to JSON for `--json`
//! and render a short text summary through [`Display`](std::fmt::Display).

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use url::Url;

use crate::filter::FilterDecision;
use crate::parser::CandidateSource;

/// An image written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub url: Url,
    pub path: PathBuf,
    pub bytes: u64,
    pub source: CandidateSource,
}

/// A candidate whose fetch or write failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadFailure {
    pub url: Url,
    /// Short machine-readable category (`http_status`, `timeout`, `write`, ...).
    pub kind: String,
    pub reason: String,
}

/// Counts and details for one pass of the download loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// Image requests issued.
    pub attempted: usize,
    pub saved: Vec<SavedImage>,
    pub failures: Vec<DownloadFailure>,
    pub filtered: Vec<FilterDecision>,
    /// Whether the loop stopped because the maximum count was reached.
    pub max_reached: bool,
}

impl DownloadReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of images written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.saved.len()
    }

    /// Number of fetch or write failures.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of candidates dropped by a filter.
    #[must_use]
    pub fn filtered_out(&self) -> usize {
        self.filtered.len()
    }

    /// Total bytes written.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.saved.iter().map(|s| s.bytes).sum()
    }
}

impl fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted {}, succeeded {}, failed {}, filtered {}",
            self.attempted,
            self.succeeded(),
            self.failed(),
            self.filtered_out()
        )?;
        if self.max_reached {
            write!(f, " (stopped at max)")?;
        }
        for failure in &self.failures {
            write!(f, "\n  failed: {} ({})", failure.url, failure.reason)?;
        }
        Ok(())
    }
}

/// Result of a complete scrape of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeReport {
    /// URL the page was served from, after redirects.
    pub page_url: Url,
    pub output_dir: PathBuf,
    /// Unique candidates extracted from the page.
    pub candidates: usize,
    pub robots_checked: bool,
    #[serde(flatten)]
    pub download: DownloadReport,
}

impl fmt::Display for ScrapeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} candidate image(s), {} bytes saved to {}",
            self.page_url,
            self.candidates,
            self.download.total_bytes(),
            self.output_dir.display()
        )?;
        write!(f, "{}", self.download)
    }
}
