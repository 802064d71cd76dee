//! imgfetch core library
//!
//! Fetches one HTML page, extracts the images it references, filters them,
//! and downloads the survivors to a local directory, one polite request at a
//! time.
//!
//! # Architecture
//!
//! Data flows strictly left to right through these modules:
//! - [`download`] - HTTP client, robots.txt policy, rate limiting, download loop
//! - [`parser`] - image reference extraction and URL resolution
//! - [`filter`] - same-domain and minimum-dimension filters
//! - [`report`] - per-run counts and details
//! - [`scrape`] - the end-to-end pipeline tying the stages together
//!
//! # Example
//!
//! ```no_run
//! use imgfetch_core::download::NoProgress;
//! use imgfetch_core::{ScrapeOptions, Scraper};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut options = ScrapeOptions::new("https://example.com/gallery");
//! options.max_images = 20;
//! options.same_domain = true;
//!
//! let report = Scraper::new(options)?.run(&mut NoProgress).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod filter;
pub mod parser;
pub mod report;
pub mod scrape;
pub mod user_agent;

// Re-export commonly used types
pub use download::{DownloadEngine, FetchError, FilesystemError, HttpClient, RateLimiter};
pub use filter::{FilterChain, FilterDecision, FilterReason};
pub use parser::{CandidateSource, ImageCandidate, extract_candidates};
pub use report::{DownloadReport, ScrapeReport};
pub use scrape::{ScrapeError, ScrapeOptions, Scraper};
