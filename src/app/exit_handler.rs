//! Exit code logic for the starsearch process.
//!
//! Maps completion/failure counts to the process exit outcome. Counts are
//! files for download runs and targets for list searches.

use starsearch_core::DownloadReport;

use crate::ProcessExit;

/// Running count of finished and failed work items.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tally {
    pub(crate) completed: usize,
    pub(crate) failed: usize,
}

impl Tally {
    /// Adds one item.
    pub(crate) fn record(&mut self, succeeded: bool) {
        if succeeded {
            self.completed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Adds every file of a batch; skipped files count as completed.
    pub(crate) fn record_report(&mut self, report: &DownloadReport) {
        self.completed += report.completed();
        self.failed += report.failed.len();
    }

    /// Adds the batches of one successful target search.
    ///
    /// A target with nothing to download still counts as one completed item.
    pub(crate) fn record_target<'a>(
        &mut self,
        reports: impl IntoIterator<Item = &'a DownloadReport>,
    ) {
        let mut files = 0;
        for report in reports {
            files += report.total();
            self.record_report(report);
        }
        if files == 0 {
            self.record(true);
        }
    }

    pub(crate) fn outcome(self) -> ProcessExit {
        determine_exit_outcome(self.completed, self.failed)
    }
}

/// Nothing failed: success. Some failed: partial, unless nothing completed.
pub(crate) fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    match (completed, failed) {
        (_, 0) => ProcessExit::Success,
        (0, _) => ProcessExit::Failure,
        _ => ProcessExit::Partial,
    }
}
