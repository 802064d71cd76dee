//! HTTP fetching and the sequential image download loop.
//!
//! # Components
//!
//! - [`HttpClient`]: one `reqwest` client per run, uniform timeout
//! - [`RobotsPolicy`]: robots.txt gate checked before the page fetch
//! - [`RateLimiter`]: fixed delay between image requests
//! - [`DownloadEngine`]: fetch, filter, name, and write each candidate
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use imgfetch_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(Duration::from_secs(20))?;
//! let page = client.fetch_page("https://example.com/gallery").await?;
//! println!("{} bytes of HTML from {}", page.html.len(), page.url);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
pub mod filename;
pub mod rate_limiter;
pub mod robots;

pub use client::{FetchedBody, HttpClient, PageResult, parse_http_url};
pub use engine::{DownloadEngine, DownloadObserver, DownloadOutcome, NoProgress};
pub use error::{FetchError, FilesystemError};
pub use filename::{filename_from_url, unique_name};
pub use rate_limiter::RateLimiter;
pub use robots::{AllowAll, HttpRobotsPolicy, RobotsDecision, RobotsPolicy, RobotsRules};

// Note: no module-local Result aliases; spell out `Result<T, FetchError>`.
