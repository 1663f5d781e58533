//! Progress bar for batch downloads.

use indicatif::{ProgressBar, ProgressStyle};
use starsearch_core::download::BatchProgress;

/// Download progress shown on stderr; a no-op when disabled.
pub(crate) struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    pub(crate) fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar: Some(bar) }
    }

    /// Updates the bar after one dataset of a batch.
    pub(crate) fn observe(&self, event: &BatchProgress<'_>) {
        let Some(bar) = &self.bar else {
            return;
        };
        bar.set_length(event.total as u64);
        bar.set_position(event.position as u64);
        let status = if event.result.is_ok() { "ok" } else { "failed" };
        bar.set_message(format!("{} {status}", event.dataset_id));
    }

    /// Prints a line without tearing the bar.
    pub(crate) fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
