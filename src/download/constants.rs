//! Defaults for the download pipeline (limits, pacing, timeouts).

use std::time::Duration;

/// Default maximum number of images saved per run.
pub const DEFAULT_MAX_IMAGES: usize = 500;

/// Default pause between image requests.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Default per-request HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "images";

/// Warning threshold for cumulative pacing delay over one run.
pub const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Extension used when neither the URL nor the Content-Type names one.
pub const FALLBACK_EXTENSION: &str = ".jpg";
