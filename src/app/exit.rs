//! Exit code logic for the imgfetch process.
//!
//! Single responsibility: map how a run ended to the process exit code.

use std::process::ExitCode;

use imgfetch_core::ScrapeError;

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// The run completed, even if some images failed.
    Success,
    /// Page fetch, output directory, or configuration failure.
    Failure,
    /// robots.txt disallowed the page.
    RobotsDenied,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::RobotsDenied => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Exit outcome for a run that ended with `error`.
pub(crate) fn exit_for_error(error: &anyhow::Error) -> ProcessExit {
    match error.downcast_ref::<ScrapeError>() {
        Some(ScrapeError::RobotsDenied { .. }) => ProcessExit::RobotsDenied,
        _ => ProcessExit::Failure,
    }
}
