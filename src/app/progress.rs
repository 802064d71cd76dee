//! Progress bar for the download loop.

use imgfetch_core::download::{DownloadObserver, DownloadOutcome};
use imgfetch_core::parser::ImageCandidate;
use imgfetch_core::report::DownloadReport;
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner} [{bar:30}] {pos}/{len} {msg}";

/// Draws an `indicatif` bar on stderr, one tick per candidate.
pub(crate) struct ProgressObserver {
    bar: ProgressBar,
    saved: usize,
    failed: usize,
}

impl ProgressObserver {
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .map(|style| style.progress_chars("=> "))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self {
            bar,
            saved: 0,
            failed: 0,
        }
    }
}

impl DownloadObserver for ProgressObserver {
    fn on_start(&mut self, candidates: usize) {
        self.bar
            .set_length(u64::try_from(candidates).unwrap_or(u64::MAX));
    }

    fn on_candidate(&mut self, candidate: &ImageCandidate) {
        let host = candidate.host().unwrap_or("?");
        self.bar.set_message(format!(
            "saved {} failed {} | {host}",
            self.saved, self.failed
        ));
    }

    fn on_outcome(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Saved(_) => self.saved += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
            DownloadOutcome::Filtered(_) => {}
        }
        self.bar.inc(1);
    }

    fn on_finish(&mut self, _report: &DownloadReport) {
        self.bar.finish_and_clear();
    }
}
