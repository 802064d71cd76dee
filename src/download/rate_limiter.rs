//! Fixed-delay pacing for sequential image requests.
//!
//! The first request of a run proceeds immediately; every later request first
//! sleeps for the configured delay. The sleep is awaited inline, so requests
//! stay strictly ordered and never overlap.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use imgfetch_core::download::RateLimiter;
//!
//! # async fn example() {
//! let mut limiter = RateLimiter::new(Duration::from_millis(300));
//!
//! // First request proceeds immediately
//! limiter.acquire().await;
//!
//! // Second request waits 300ms
//! limiter.acquire().await;
//! assert_eq!(limiter.total_delay(), Duration::from_millis(300));
//! # }
//! ```

use std::time::Duration;

use tracing::{debug, instrument, trace, warn};

use super::constants::CUMULATIVE_DELAY_WARNING_THRESHOLD;

/// Sequential request pacer.
#[derive(Debug)]
pub struct RateLimiter {
    /// Pause inserted before every request after the first.
    delay: Duration,

    /// Whether pacing is disabled (`--delay 0`).
    disabled: bool,

    /// Number of permits handed out so far.
    acquired: usize,

    /// Sum of all pauses taken.
    total_delay: Duration,

    /// Set once the cumulative warning has been logged.
    warned: bool,
}

impl RateLimiter {
    /// Creates a pacer sleeping `delay` between requests.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = delay.as_millis()))]
    pub fn new(delay: Duration) -> Self {
        if delay.is_zero() {
            return Self::disabled();
        }
        debug!("creating rate limiter");
        Self {
            delay,
            disabled: false,
            acquired: 0,
            total_delay: Duration::ZERO,
            warned: false,
        }
    }

    /// Creates a pacer that never sleeps.
    #[must_use]
    #[instrument]
    pub fn disabled() -> Self {
        debug!("creating disabled rate limiter");
        Self {
            delay: Duration::ZERO,
            disabled: true,
            acquired: 0,
            total_delay: Duration::ZERO,
            warned: false,
        }
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns how many requests have been admitted.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.acquired
    }

    /// Returns the total time spent sleeping.
    #[must_use]
    pub fn total_delay(&self) -> Duration {
        self.total_delay
    }

    /// Waits until the next request may be issued.
    pub async fn acquire(&mut self) {
        let first = self.acquired == 0;
        self.acquired += 1;

        if self.disabled || first {
            trace!(request = self.acquired, "no pacing delay");
            return;
        }

        trace!(request = self.acquired, delay_ms = self.delay.as_millis(), "pacing");
        tokio::time::sleep(self.delay).await;
        self.total_delay += self.delay;

        if !self.warned && self.total_delay >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
            self.warned = true;
            warn!(
                total_delay_secs = self.total_delay.as_secs(),
                "cumulative pacing delay is high; consider lowering --max or --delay"
            );
        }
    }
}
