//! Binary-side orchestration: config, logging, progress, output, exit codes.

mod config;
mod exit;
mod progress;
mod settings;
mod terminal;

use anyhow::{Context, Result};
use imgfetch_core::download::{DownloadObserver, NoProgress};
use imgfetch_core::{ScrapeReport, Scraper};
use tracing::{debug, info};

use crate::cli::Args;
pub(crate) use exit::ProcessExit;

/// Runs one scrape for `args` and maps the result to an exit outcome.
pub(crate) async fn run(args: Args) -> ProcessExit {
    terminal::init_tracing(terminal::default_log_level(args.quiet, args.verbose));
    debug!(?args, "CLI arguments parsed");

    match scrape(&args).await {
        Ok(report) => {
            print_report(&report, args.json);
            ProcessExit::Success
        }
        Err(error) => {
            let exit = exit::exit_for_error(&error);
            tracing::error!("{error:#}");
            exit
        }
    }
}

async fn scrape(args: &Args) -> Result<ScrapeReport> {
    let loaded = match &args.config {
        Some(path) => config::load_explicit(path)?,
        None => config::load_default()?,
    };
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "loaded config file");
    }

    let options = settings::resolve_options(args, &loaded.config);
    info!(
        url = %options.url,
        out = %options.output_dir.display(),
        max = options.max_images,
        delay_ms = options.delay.as_millis(),
        robots = options.check_robots,
        "imgfetch starting"
    );

    let scraper = Scraper::new(options)?;
    let mut observer: Box<dyn DownloadObserver> = if terminal::should_show_progress(
        terminal::stderr_is_terminal(),
        args.quiet,
        args.json,
        args.no_progress,
    ) {
        Box::new(progress::ProgressObserver::new())
    } else {
        Box::new(NoProgress)
    };

    let report = scraper
        .run(observer.as_mut())
        .await
        .with_context(|| format!("scrape of {} failed", args.url))?;
    info!(
        saved = report.download.succeeded(),
        failed = report.download.failed(),
        "scrape complete"
    );
    Ok(report)
}

fn print_report(report: &ScrapeReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{text}"),
            Err(error) => tracing::error!(%error, "failed to serialize report"),
        }
    } else {
        println!("{report}");
    }
}
