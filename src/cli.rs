//! CLI argument definitions using clap derive macros.
//!
//! Value-bearing options are `Option`s so that config file values can fill
//! in whatever was not given on the command line.

use std::path::PathBuf;

use clap::Parser;

/// Download the images referenced by a single web page.
///
/// Fetches one HTML page, collects the images it references, and saves them
/// to a local directory, pausing between requests and honoring robots.txt.
#[derive(Parser, Debug)]
#[command(name = "imgfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Page to scrape (http or https)
    #[arg(short, long)]
    pub url: String,

    /// Output directory, created if missing [default: images]
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Maximum number of images to save [default: 500]
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max: Option<u64>,

    /// Seconds to wait between image requests [default: 0.3]
    #[arg(short, long, value_name = "SECS", value_parser = parse_delay)]
    pub delay: Option<f64>,

    /// Per-request timeout in seconds [default: 20]
    #[arg(short, long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<f64>,

    /// Only keep images served from the page's own host
    #[arg(long)]
    pub same_domain: bool,

    /// Skip images narrower than this many pixels (0 disables)
    #[arg(long, value_name = "PX")]
    pub min_width: Option<u32>,

    /// Skip images shorter than this many pixels (0 disables)
    #[arg(long, value_name = "PX")]
    pub min_height: Option<u32>,

    /// Do not consult robots.txt (discouraged)
    #[arg(long)]
    pub no_robots: bool,

    /// User-Agent header to send instead of the default
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Read defaults from this config file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_delay(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err("delay must be a non-negative number of seconds".to_string())
    }
}

fn parse_timeout(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err("timeout must be greater than 0 seconds".to_string())
    }
}
