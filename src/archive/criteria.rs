//! Search criteria for spectrum queries.
//!
//! A [`SearchCriteria`] holds every filter of a single-target search. The same
//! criteria are rendered into ADQL (see [`super::adql`]) and re-applied to the
//! returned rows with [`SearchCriteria::matches`].

use chrono::NaiveDate;
use serde::Serialize;

use super::ArchiveError;
use super::mjd::date_to_mjd;
use super::record::SpectrumRecord;

/// Instruments searched when none is given.
pub const DEFAULT_INSTRUMENTS: [&str; 4] = ["FEROS", "UVES", "HARPS", "ESPRESSO"];

/// Earliest observation date applied when none is given.
pub const DEFAULT_SINCE: &str = "1990-01-23";

/// Minimum signal-to-noise ratio applied when none is given.
pub const DEFAULT_MIN_SNR: f64 = 30.0;

/// Similarity above which an unknown instrument gets a "did you mean" hint.
const INSTRUMENT_SUGGESTION_THRESHOLD: f64 = 0.6;

/// Inclusive calendar date range. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// First day included.
    pub since: Option<NaiveDate>,
    /// Last day included.
    pub until: Option<NaiveDate>,
}

impl DateRange {
    /// Range with no bounds.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Range starting at `since` with no upper bound.
    #[must_use]
    pub fn since(since: NaiveDate) -> Self {
        Self {
            since: Some(since),
            until: None,
        }
    }

    /// Range covering `since` through `until`, both inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCriteria`] if `until` precedes `since`.
    pub fn between(since: NaiveDate, until: NaiveDate) -> Result<Self, ArchiveError> {
        if until < since {
            return Err(ArchiveError::invalid_criteria(format!(
                "date range ends ({until}) before it starts ({since})"
            )));
        }
        Ok(Self {
            since: Some(since),
            until: Some(until),
        })
    }

    /// Lower MJD bound (inclusive).
    #[must_use]
    pub fn start_mjd(&self) -> Option<f64> {
        self.since.map(date_to_mjd)
    }

    /// Upper MJD bound (exclusive): midnight after `until`.
    #[must_use]
    pub fn end_mjd(&self) -> Option<f64> {
        self.until.map(|d| date_to_mjd(d) + 1.0)
    }

    /// Whether an observation starting at `mjd` lies within the range.
    #[must_use]
    pub fn contains_mjd(&self, mjd: f64) -> bool {
        self.start_mjd().is_none_or(|start| mjd >= start)
            && self.end_mjd().is_none_or(|end| mjd < end)
    }
}

/// Filters for a spectrum search of one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCriteria {
    /// Target name as known to the archive.
    pub target: String,
    /// Instruments to include. Never empty after construction.
    pub instruments: Vec<String>,
    /// Observation date window.
    pub dates: DateRange,
    /// Minimum SNR; `None` disables the filter.
    pub min_snr: Option<f64>,
}

impl SearchCriteria {
    /// Criteria for `target` with the default instruments, date and SNR.
    #[must_use]
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            instruments: DEFAULT_INSTRUMENTS.iter().map(ToString::to_string).collect(),
            dates: DateRange::since(default_since()),
            min_snr: Some(DEFAULT_MIN_SNR),
        }
    }

    /// Criteria for `target` with no filters besides the default instruments.
    #[must_use]
    pub fn unfiltered(target: impl Into<String>) -> Self {
        Self {
            dates: DateRange::unbounded(),
            min_snr: None,
            ..Self::for_target(target)
        }
    }

    /// Restricts the search to a single instrument. A blank name keeps the
    /// current set.
    #[must_use]
    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        let instrument = normalize_instrument(&instrument.into());
        if !instrument.is_empty() {
            self.instruments = vec![instrument];
        }
        self
    }

    /// Replaces the instrument set. An empty list keeps the current set.
    #[must_use]
    pub fn with_instruments<I, S>(mut self, instruments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list: Vec<String> = instruments
            .into_iter()
            .map(|i| normalize_instrument(i.as_ref()))
            .filter(|i| !i.is_empty())
            .collect();
        if !list.is_empty() {
            self.instruments = list;
        }
        self
    }

    /// Replaces the date window.
    #[must_use]
    pub fn with_dates(mut self, dates: DateRange) -> Self {
        self.dates = dates;
        self
    }

    /// Replaces the SNR threshold.
    #[must_use]
    pub fn with_min_snr(mut self, min_snr: Option<f64>) -> Self {
        self.min_snr = min_snr;
        self
    }

    /// Same filters, different target.
    #[must_use]
    pub fn retarget(&self, target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..self.clone()
        }
    }

    /// Checks that the criteria can be turned into a query.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCriteria`] for an empty target, an empty
    /// instrument list or blank instrument name, or a negative / non-finite
    /// SNR threshold.
    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.target.trim().is_empty() {
            return Err(ArchiveError::invalid_criteria("target name is empty"));
        }
        if self.instruments.is_empty() {
            return Err(ArchiveError::invalid_criteria("no instruments selected"));
        }
        if self.instruments.iter().any(|i| i.trim().is_empty()) {
            return Err(ArchiveError::invalid_criteria("instrument name is empty"));
        }
        if let Some(snr) = self.min_snr
            && (!snr.is_finite() || snr < 0.0)
        {
            return Err(ArchiveError::invalid_criteria(format!(
                "minimum SNR must be a non-negative number, got {snr}"
            )));
        }
        Ok(())
    }

    /// Whether `record` satisfies every filter.
    ///
    /// Rows without an SNR never satisfy an SNR threshold.
    #[must_use]
    pub fn matches(&self, record: &SpectrumRecord) -> bool {
        let instrument_ok = self
            .instruments
            .iter()
            .any(|i| i.eq_ignore_ascii_case(record.instrument.trim()));
        let date_ok = self.dates.contains_mjd(record.mjd_obs);
        let snr_ok = match self.min_snr {
            None => true,
            Some(threshold) => record.snr.is_some_and(|snr| snr >= threshold),
        };
        instrument_ok && date_ok && snr_ok
    }
}

/// The default earliest observation date.
#[must_use]
pub fn default_since() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 23).unwrap_or_default()
}

/// Upper-cases and trims an instrument name (`" harps "` → `"HARPS"`).
#[must_use]
pub fn normalize_instrument(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Closest default instrument to an unrecognised name, if any is close enough.
#[must_use]
pub fn suggest_instrument(name: &str) -> Option<&'static str> {
    let normalized = normalize_instrument(name);
    if DEFAULT_INSTRUMENTS.contains(&normalized.as_str()) {
        return None;
    }
    DEFAULT_INSTRUMENTS
        .iter()
        .map(|candidate| (*candidate, strsim::normalized_levenshtein(&normalized, candidate)))
        .filter(|(_, score)| *score >= INSTRUMENT_SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}
