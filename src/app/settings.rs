//! Merges command-line flags with config file values.
//!
//! Precedence: explicit flag, then config file, then built-in default.

use std::time::Duration;

use imgfetch_core::ScrapeOptions;

use super::config::FileConfig;
use crate::cli::Args;

/// Builds run options from parsed flags and the loaded config file.
pub(crate) fn resolve_options(args: &Args, file: &FileConfig) -> ScrapeOptions {
    let mut options = ScrapeOptions::new(args.url.clone());

    if let Some(dir) = args.out.clone().or_else(|| file.output_dir.clone()) {
        options.output_dir = dir;
    }
    if let Some(max) = args
        .max
        .map(|m| usize::try_from(m).unwrap_or(usize::MAX))
        .or(file.max_images)
    {
        options.max_images = max;
    }
    if let Some(delay) = args.delay.or(file.delay_secs) {
        options.delay = Duration::from_secs_f64(delay);
    }
    if let Some(timeout) = args.timeout.or(file.timeout_secs) {
        options.timeout = Duration::from_secs_f64(timeout);
    }

    options.same_domain = args.same_domain || file.same_domain.unwrap_or(false);
    options.check_robots = !args.no_robots && file.check_robots.unwrap_or(true);
    options.min_width = args.min_width.or(file.min_width).unwrap_or(0);
    options.min_height = args.min_height.or(file.min_height).unwrap_or(0);
    options.user_agent = args.user_agent.clone().or_else(|| file.user_agent.clone());
    options
}
