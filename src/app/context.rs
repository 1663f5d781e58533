//! Effective run settings: CLI flags over config file over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use starsearch_core::archive::{
    DEFAULT_INSTRUMENTS, DEFAULT_MIN_SNR, DateRange, SearchCriteria, default_since,
    suggest_instrument,
};
use starsearch_core::http_client::HttpTimeouts;
use starsearch_core::ArchiveConfig;
use tracing::warn;

use crate::app_config::FileConfig;
use crate::cli::{Cli, FilterArgs};

/// Search defaults applied when a filter flag is absent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchDefaults {
    pub(crate) instruments: Vec<String>,
    pub(crate) since: NaiveDate,
    pub(crate) min_snr: f64,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            instruments: DEFAULT_INSTRUMENTS.iter().map(ToString::to_string).collect(),
            since: default_since(),
            min_snr: DEFAULT_MIN_SNR,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RunContext {
    pub(crate) archive: ArchiveConfig,
    pub(crate) user: Option<String>,
    pub(crate) output_dir: PathBuf,
    pub(crate) defaults: SearchDefaults,
    pub(crate) show_progress: bool,
}

impl RunContext {
    pub(crate) fn resolve(cli: &Cli, file: Option<&FileConfig>, show_progress: bool) -> Self {
        let file = file.cloned().unwrap_or_default();
        let builtin = ArchiveConfig::default();
        let builtin_timeouts = HttpTimeouts::default();
        let builtin_defaults = SearchDefaults::default();

        let archive = ArchiveConfig {
            tap_url: cli.tap_url.clone().or(file.tap_url).unwrap_or(builtin.tap_url),
            data_url: cli.data_url.clone().or(file.data_url).unwrap_or(builtin.data_url),
            token_url: file.token_url.unwrap_or(builtin.token_url),
            timeouts: HttpTimeouts {
                connect_secs: file
                    .connect_timeout_secs
                    .unwrap_or(builtin_timeouts.connect_secs),
                read_secs: file.read_timeout_secs.unwrap_or(builtin_timeouts.read_secs),
            },
            max_rows: file.max_rows,
        };

        Self {
            archive,
            user: cli.user.clone().or(file.user),
            output_dir: file.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            defaults: SearchDefaults {
                instruments: file.instruments.unwrap_or(builtin_defaults.instruments),
                since: file.since.unwrap_or(builtin_defaults.since),
                min_snr: file.min_snr.unwrap_or(builtin_defaults.min_snr),
            },
            show_progress,
        }
    }

    /// Output directory, preferring a per-command override.
    pub(crate) fn output_dir_for<'a>(&'a self, flag: Option<&'a Path>) -> &'a Path {
        flag.unwrap_or(&self.output_dir)
    }

    /// Search criteria for `star` from filter flags and the configured defaults.
    pub(crate) fn criteria_for(&self, star: &str, filters: &FilterArgs) -> Result<SearchCriteria> {
        for name in &filters.instrument {
            if let Some(suggestion) = suggest_instrument(name) {
                warn!(
                    instrument = %name,
                    "unknown instrument; did you mean {suggestion}?"
                );
            }
        }

        let since = if filters.all_dates {
            None
        } else {
            Some(filters.since.unwrap_or(self.defaults.since))
        };
        let dates = match (since, filters.until) {
            (Some(since), Some(until)) => DateRange::between(since, until)?,
            (Some(since), None) => DateRange::since(since),
            (None, until) => DateRange {
                since: None,
                until,
            },
        };
        let min_snr = if filters.any_snr {
            None
        } else {
            Some(filters.min_snr.unwrap_or(self.defaults.min_snr))
        };

        let criteria = SearchCriteria::for_target(star.trim())
            .with_instruments(&self.defaults.instruments)
            .with_instruments(&filters.instrument)
            .with_dates(dates)
            .with_min_snr(min_snr);
        criteria.validate()?;
        Ok(criteria)
    }
}
