//! Candidate filtering.
//!
//! Two independent filters compose into a [`FilterChain`]:
//!
//! - [`SameDomainFilter`] compares the candidate host with the page host and
//!   runs before any request is made.
//! - [`DimensionFilter`] inspects the bytes the downloader fetched and drops
//!   images below the configured minimum size.
//!
//! A candidate must pass every enabled filter. Rejections are returned as
//! [`FilterDecision`]s so the report can say why each one was skipped.

mod dimensions;

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::parser::ImageCandidate;

pub use dimensions::{DecodeError, DimensionProbe, Dimensions, default_probe};
#[cfg(feature = "dimensions")]
pub use dimensions::ImageSizeProbe;

/// Why a candidate was filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterReason {
    /// Candidate host differs from the page host.
    DomainMismatch { expected: String, found: String },
    /// Image is narrower or shorter than the configured minimum.
    TooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    /// Image dimensions could not be read.
    Unreadable { reason: String },
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainMismatch { expected, found } => {
                write!(f, "host {found} does not match {expected}")
            }
            Self::TooSmall {
                width,
                height,
                min_width,
                min_height,
            } => write!(
                f,
                "{width}x{height} is below the minimum {min_width}x{min_height}"
            ),
            Self::Unreadable { reason } => write!(f, "unreadable image: {reason}"),
        }
    }
}

/// Outcome of running one candidate through the filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDecision {
    pub candidate: ImageCandidate,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FilterReason>,
}

impl FilterDecision {
    /// Candidate passed every applicable filter.
    #[must_use]
    pub fn pass(candidate: ImageCandidate) -> Self {
        Self {
            candidate,
            passed: true,
            reason: None,
        }
    }

    /// Candidate was rejected.
    #[must_use]
    pub fn reject(candidate: ImageCandidate, reason: FilterReason) -> Self {
        Self {
            candidate,
            passed: false,
            reason: Some(reason),
        }
    }
}

/// Keeps candidates served from exactly the page's host.
///
/// Hosts compare case-insensitively; ports are ignored. Subdomains do not
/// match (`cdn.example.com` is not `example.com`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SameDomainFilter {
    host: String,
}

impl SameDomainFilter {
    /// Filter for pages served at `base`. `None` if `base` has no host.
    #[must_use]
    pub fn for_base(base: &Url) -> Option<Self> {
        base.host_str().map(|host| Self {
            host: host.to_ascii_lowercase(),
        })
    }

    /// The host candidates must match.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Checks one candidate.
    ///
    /// # Errors
    ///
    /// Returns [`FilterReason::DomainMismatch`] when the hosts differ.
    pub fn check(&self, candidate: &ImageCandidate) -> Result<(), FilterReason> {
        let found = candidate.host().unwrap_or_default();
        if found.eq_ignore_ascii_case(&self.host) {
            Ok(())
        } else {
            Err(FilterReason::DomainMismatch {
                expected: self.host.clone(),
                found: found.to_ascii_lowercase(),
            })
        }
    }
}

/// Drops images smaller than a minimum width and/or height.
#[derive(Debug)]
pub struct DimensionFilter {
    min_width: u32,
    min_height: u32,
    probe: Box<dyn DimensionProbe>,
}

impl DimensionFilter {
    /// Creates a filter. A zero minimum disables that axis.
    #[must_use]
    pub fn new(min_width: u32, min_height: u32, probe: Box<dyn DimensionProbe>) -> Self {
        Self {
            min_width,
            min_height,
            probe,
        }
    }

    /// Checks fetched image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FilterReason::Unreadable`] if the probe cannot decode the
    /// bytes, [`FilterReason::TooSmall`] if either axis is below its minimum.
    pub fn check(&self, bytes: &[u8]) -> Result<Dimensions, FilterReason> {
        let dims = self
            .probe
            .dimensions(bytes)
            .map_err(|e| FilterReason::Unreadable {
                reason: e.reason().to_string(),
            })?;
        if dims.width < self.min_width || dims.height < self.min_height {
            return Err(FilterReason::TooSmall {
                width: dims.width,
                height: dims.height,
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }
        Ok(dims)
    }
}

/// The enabled filters for one run.
#[derive(Debug, Default)]
pub struct FilterChain {
    same_domain: Option<SameDomainFilter>,
    dimensions: Option<DimensionFilter>,
}

impl FilterChain {
    /// A chain that passes everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the same-domain filter against `base`'s host.
    #[must_use]
    pub fn with_same_domain(mut self, base: &Url) -> Self {
        self.same_domain = SameDomainFilter::for_base(base);
        match &self.same_domain {
            Some(filter) => debug!(host = filter.host(), "same-domain filter enabled"),
            None => warn!(base = %base, "page URL has no host; same-domain filter disabled"),
        }
        self
    }

    /// Enables the dimension filter when either minimum is non-zero.
    ///
    /// Without a probe (the `dimensions` feature is off) the filter is skipped
    /// and a warning is logged.
    #[must_use]
    pub fn with_dimensions(
        mut self,
        min_width: u32,
        min_height: u32,
        probe: Option<Box<dyn DimensionProbe>>,
    ) -> Self {
        if min_width == 0 && min_height == 0 {
            return self;
        }
        match probe {
            Some(probe) => {
                debug!(min_width, min_height, "dimension filter enabled");
                self.dimensions = Some(DimensionFilter::new(min_width, min_height, probe));
            }
            None => {
                warn!(
                    min_width,
                    min_height,
                    "image dimension support not compiled in; --min-width/--min-height ignored"
                );
            }
        }
        self
    }

    /// Whether the same-domain filter is active.
    #[must_use]
    pub fn filters_domain(&self) -> bool {
        self.same_domain.is_some()
    }

    /// Whether candidates must be fetched before a final decision.
    #[must_use]
    pub fn needs_bytes(&self) -> bool {
        self.dimensions.is_some()
    }

    /// Applies the filters that need only the URL.
    #[must_use]
    pub fn screen_url(&self, candidate: ImageCandidate) -> FilterDecision {
        if let Some(filter) = &self.same_domain
            && let Err(reason) = filter.check(&candidate)
        {
            debug!(url = %candidate.url, %reason, "filtered");
            return FilterDecision::reject(candidate, reason);
        }
        FilterDecision::pass(candidate)
    }

    /// Applies the filters that need the fetched image bytes.
    #[must_use]
    pub fn screen_bytes(&self, candidate: ImageCandidate, bytes: &[u8]) -> FilterDecision {
        if let Some(filter) = &self.dimensions {
            match filter.check(bytes) {
                Ok(dims) => debug!(url = %candidate.url, %dims, "dimensions ok"),
                Err(reason) => {
                    debug!(url = %candidate.url, %reason, "filtered");
                    return FilterDecision::reject(candidate, reason);
                }
            }
        }
        FilterDecision::pass(candidate)
    }
}
