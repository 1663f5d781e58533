//! The `StarSearch` facade over the archive and the downloader.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::error::ConnectError;
use crate::archive::{
    Archive, ArchiveError, Credentials, DEFAULT_INSTRUMENTS, DEFAULT_TAP_URL, DEFAULT_TOKEN_URL,
    DateRange, SearchCriteria, SpectrumRecord, TapArchive, fetch_token, normalize_instrument,
};
use crate::download::{
    BatchProgress, DEFAULT_DATA_URL, DownloadClient, DownloadReport, download_records,
};
use crate::http_client::{HttpTimeouts, build_http_client};
use crate::user_agent::default_user_agent;

/// Endpoints and limits used to reach the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// TAP service root (the `/sync` endpoint is appended).
    pub tap_url: String,
    /// Data portal file endpoint.
    pub data_url: String,
    /// ESO single sign-on token endpoint.
    pub token_url: String,
    /// HTTP timeouts.
    pub timeouts: HttpTimeouts,
    /// `MAXREC` sent with queries; `None` means unlimited.
    pub max_rows: Option<u64>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            tap_url: DEFAULT_TAP_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeouts: HttpTimeouts::default(),
            max_rows: None,
        }
    }
}

/// Search outcome for one entry of a target list.
#[derive(Debug)]
pub struct TargetResult {
    /// Target name as queried.
    pub target: String,
    /// Matching spectra, or why the search failed.
    pub result: Result<Vec<SpectrumRecord>, ArchiveError>,
}

/// What a get-data call did for one instrument.
#[derive(Debug)]
pub enum InstrumentDownload {
    /// The instrument never observed the target.
    NoData {
        /// Instrument name.
        instrument: String,
    },
    /// Matching spectra were searched for and downloaded.
    Fetched {
        /// Instrument name.
        instrument: String,
        /// Number of spectra that matched the filters.
        found: usize,
        /// Per-file results.
        report: DownloadReport,
    },
}

impl InstrumentDownload {
    /// Instrument this entry is about.
    #[must_use]
    pub fn instrument(&self) -> &str {
        match self {
            Self::NoData { instrument } | Self::Fetched { instrument, .. } => instrument,
        }
    }

    /// Download report, if anything was searched for.
    #[must_use]
    pub fn report(&self) -> Option<&DownloadReport> {
        match self {
            Self::NoData { .. } => None,
            Self::Fetched { report, .. } => Some(report),
        }
    }
}

/// When a spectrum was observed and when it became public.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumDates {
    pub mjd_obs: f64,
    /// ISO timestamp; `None` when the archive gives no release date.
    pub release_date: Option<String>,
}

impl From<&SpectrumRecord> for SpectrumDates {
    fn from(record: &SpectrumRecord) -> Self {
        Self {
            mjd_obs: record.mjd_obs,
            release_date: record
                .release_date
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(ToString::to_string),
        }
    }
}

/// Search and download client for ESO stellar spectra.
///
/// Every search re-applies its [`SearchCriteria`] to the rows the archive
/// returned, so results always honour the requested instrument, date window
/// and SNR threshold.
pub struct StarSearch {
    archive: Arc<dyn Archive>,
    downloader: DownloadClient,
}

impl std::fmt::Debug for StarSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarSearch")
            .field("downloader", &self.downloader)
            .finish_non_exhaustive()
    }
}

impl StarSearch {
    /// Wires an archive backend and a downloader together.
    #[must_use]
    pub fn new(archive: Arc<dyn Archive>, downloader: DownloadClient) -> Self {
        Self {
            archive,
            downloader,
        }
    }

    /// Connects to the ESO archive, logging in first when `user` is given.
    ///
    /// The password is taken from `STARSEARCH_PASSWORD` or the system
    /// keyring. Anonymous sessions only see public data.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::HttpClient`] if the HTTP client cannot be
    /// built and [`ConnectError::Login`] if the login fails.
    #[instrument(skip(config), fields(tap_url = %config.tap_url))]
    pub async fn connect(config: &ArchiveConfig, user: Option<&str>) -> Result<Self, ConnectError> {
        let client = build_http_client(&default_user_agent(), config.timeouts)
            .map_err(ConnectError::http_client)?;

        let token = match user.map(str::trim).filter(|u| !u.is_empty()) {
            Some(user) => {
                let credentials = Credentials::lookup(user)?;
                let token = fetch_token(&client, &config.token_url, &credentials).await?;
                info!(user, "logged in to the ESO archive");
                Some(token)
            }
            None => {
                debug!("querying the ESO archive anonymously");
                None
            }
        };

        let archive = TapArchive::new(client.clone(), config.tap_url.as_str())
            .with_token(token.clone())
            .with_max_rows(config.max_rows);
        let downloader = DownloadClient::new(client, config.data_url.as_str()).with_token(token);
        Ok(Self::new(Arc::new(archive), downloader))
    }

    /// The downloader used for retrievals.
    #[must_use]
    pub fn downloader(&self) -> &DownloadClient {
        &self.downloader
    }

    /// Spectra of a target matching every filter in `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidCriteria`] for unusable criteria and
    /// the archive's error if the query fails.
    #[instrument(skip(self, criteria), fields(target = %criteria.target))]
    pub async fn search_star(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<SpectrumRecord>, ArchiveError> {
        criteria.validate()?;
        let mut records = self.archive.search_spectra(criteria).await?;
        let returned = records.len();
        records.retain(|record| criteria.matches(record));
        if records.len() < returned {
            debug!(
                dropped = returned - records.len(),
                "archive returned rows outside the search criteria"
            );
        }
        info!(count = records.len(), "spectra found");
        Ok(records)
    }

    /// Spectra of `star` recorded with `instrument`, default date and SNR filters.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::search_star`].
    pub async fn search_by_instrument(
        &self,
        star: &str,
        instrument: &str,
    ) -> Result<Vec<SpectrumRecord>, ArchiveError> {
        self.search_star(&SearchCriteria::for_target(star).with_instrument(instrument))
            .await
    }

    /// Spectra of `star` observed within `dates`, default SNR filter.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::search_star`].
    pub async fn search_by_date(
        &self,
        star: &str,
        instrument: Option<&str>,
        dates: DateRange,
    ) -> Result<Vec<SpectrumRecord>, ArchiveError> {
        let criteria = restrict(SearchCriteria::for_target(star), instrument).with_dates(dates);
        self.search_star(&criteria).await
    }

    /// Spectra of `star` with SNR at least `min_snr`, default date filter.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::search_star`].
    pub async fn search_by_snr(
        &self,
        star: &str,
        instrument: Option<&str>,
        min_snr: f64,
    ) -> Result<Vec<SpectrumRecord>, ArchiveError> {
        let criteria =
            restrict(SearchCriteria::for_target(star), instrument).with_min_snr(Some(min_snr));
        self.search_star(&criteria).await
    }

    /// Instruments that observed `star`, with raw observation counts.
    ///
    /// These are raw frames, so the numbers can differ from the number of
    /// reduced spectra available for download.
    ///
    /// # Errors
    ///
    /// Returns the archive's error if the query fails.
    #[instrument(skip(self))]
    pub async fn search_instruments(
        &self,
        star: &str,
    ) -> Result<BTreeMap<String, usize>, ArchiveError> {
        if star.trim().is_empty() {
            return Err(ArchiveError::invalid_criteria("target name is empty"));
        }
        self.archive.instrument_counts(star.trim()).await
    }

    /// Number of downloadable spectra per instrument under the default filters.
    ///
    /// With `instrument` set only that instrument is counted; otherwise every
    /// default instrument gets an entry, zero included.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::search_star`].
    pub async fn search_instrument_spectra(
        &self,
        star: &str,
        instrument: Option<&str>,
    ) -> Result<BTreeMap<String, usize>, ArchiveError> {
        let criteria = restrict(SearchCriteria::for_target(star), instrument);
        let records = self.search_star(&criteria).await?;

        let mut counts: BTreeMap<String, usize> = criteria
            .instruments
            .iter()
            .map(|i| (i.clone(), 0))
            .collect();
        for record in &records {
            let name = normalize_instrument(&record.instrument);
            if let Some(count) = counts.get_mut(&name) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    /// Observation and release dates of every spectrum of `star`, unfiltered
    /// except by instrument.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::search_star`].
    pub async fn search_star_dates(
        &self,
        star: &str,
        instrument: Option<&str>,
    ) -> Result<Vec<SpectrumDates>, ArchiveError> {
        let criteria = restrict(SearchCriteria::unfiltered(star), instrument);
        let records = self.search_star(&criteria).await?;
        Ok(records.iter().map(SpectrumDates::from).collect())
    }

    /// Observation start times (MJD) of every spectrum of `star`.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::search_star`].
    pub async fn search_observation_dates(
        &self,
        star: &str,
        instrument: Option<&str>,
    ) -> Result<Vec<f64>, ArchiveError> {
        let dates = self.search_star_dates(star, instrument).await?;
        Ok(dates.into_iter().map(|d| d.mjd_obs).collect())
    }

    /// Public release dates of every spectrum of `star`.
    ///
    /// Spectra the archive lists without a release date are left out.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::search_star`].
    pub async fn search_release_dates(
        &self,
        star: &str,
        instrument: Option<&str>,
    ) -> Result<Vec<String>, ArchiveError> {
        let dates = self.search_star_dates(star, instrument).await?;
        Ok(dates.into_iter().filter_map(|d| d.release_date).collect())
    }

    /// Searches every target in `targets` with the filters of `template`.
    ///
    /// One entry per input target, in input order. A failed search is kept
    /// in its entry and the remaining targets are still searched.
    #[instrument(skip(self, targets, template), fields(targets = targets.len()))]
    pub async fn search_targets(
        &self,
        targets: &[String],
        template: &SearchCriteria,
    ) -> Vec<TargetResult> {
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let result = self.search_star(&template.retarget(target.as_str())).await;
            if let Err(error) = &result {
                warn!(target = %target, error = %error, "target search failed");
            }
            results.push(TargetResult {
                target: target.clone(),
                result,
            });
        }
        results
    }

    /// Downloads the datasets of `records` into `output_dir`, one at a time.
    pub async fn download<F>(
        &self,
        records: &[SpectrumRecord],
        output_dir: &Path,
        overwrite: bool,
        observer: F,
    ) -> DownloadReport
    where
        F: FnMut(BatchProgress<'_>),
    {
        download_records(&self.downloader, records, output_dir, overwrite, observer).await
    }

    /// Searches and downloads a target's spectra, instrument by instrument.
    ///
    /// The instruments that observed the target are looked up first; each
    /// instrument of `criteria` that is missing there yields
    /// [`InstrumentDownload::NoData`] without a spectra query.
    ///
    /// # Errors
    ///
    /// Returns the first archive error. Download failures are reported per
    /// file in each [`DownloadReport`].
    #[instrument(skip(self, criteria, observer), fields(target = %criteria.target))]
    pub async fn get_data<F>(
        &self,
        criteria: &SearchCriteria,
        output_dir: &Path,
        overwrite: bool,
        mut observer: F,
    ) -> Result<Vec<InstrumentDownload>, ArchiveError>
    where
        F: FnMut(BatchProgress<'_>),
    {
        criteria.validate()?;
        let observed = self.search_instruments(&criteria.target).await?;

        let mut outcomes = Vec::with_capacity(criteria.instruments.len());
        for instrument in &criteria.instruments {
            let has_data = observed
                .keys()
                .any(|name| name.trim().eq_ignore_ascii_case(instrument));
            if !has_data {
                info!(instrument = %instrument, "no observations with this instrument");
                outcomes.push(InstrumentDownload::NoData {
                    instrument: instrument.clone(),
                });
                continue;
            }

            let records = self
                .search_star(&criteria.clone().with_instrument(instrument.as_str()))
                .await?;
            let report = self
                .download(&records, output_dir, overwrite, &mut observer)
                .await;
            outcomes.push(InstrumentDownload::Fetched {
                instrument: instrument.clone(),
                found: records.len(),
                report,
            });
        }
        Ok(outcomes)
    }

    /// [`StarSearch::get_data`] over the default instrument set.
    ///
    /// # Errors
    ///
    /// See [`StarSearch::get_data`].
    pub async fn get_all_data<F>(
        &self,
        criteria: &SearchCriteria,
        output_dir: &Path,
        overwrite: bool,
        observer: F,
    ) -> Result<Vec<InstrumentDownload>, ArchiveError>
    where
        F: FnMut(BatchProgress<'_>),
    {
        let criteria = criteria.clone().with_instruments(DEFAULT_INSTRUMENTS);
        self.get_data(&criteria, output_dir, overwrite, observer)
            .await
    }
}

fn restrict(criteria: SearchCriteria, instrument: Option<&str>) -> SearchCriteria {
    match instrument {
        Some(instrument) => criteria.with_instrument(instrument),
        None => criteria,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use reqwest::Client;
    use tempfile::TempDir;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::archive::mjd::date_to_mjd;

    /// Archive that ignores the criteria and returns everything it holds.
    struct LenientArchive {
        records: Vec<SpectrumRecord>,
        counts: BTreeMap<String, usize>,
        failing_target: Option<&'static str>,
    }

    #[async_trait]
    impl Archive for LenientArchive {
        async fn search_spectra(
            &self,
            criteria: &SearchCriteria,
        ) -> Result<Vec<SpectrumRecord>, ArchiveError> {
            if self.failing_target == Some(criteria.target.as_str()) {
                return Err(ArchiveError::http_status("https://tap.test/sync", 500, "boom"));
            }
            Ok(self
                .records
                .iter()
                .map(|r| SpectrumRecord {
                    target: criteria.target.clone(),
                    ..r.clone()
                })
                .collect())
        }

        async fn instrument_counts(
            &self,
            _target: &str,
        ) -> Result<BTreeMap<String, usize>, ArchiveError> {
            Ok(self.counts.clone())
        }
    }

    fn mjd(y: i32, m: u32, d: u32) -> f64 {
        date_to_mjd(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn record(id: &str, instrument: &str, mjd_obs: f64, snr: Option<f64>) -> SpectrumRecord {
        SpectrumRecord {
            dataset_id: id.to_string(),
            target: String::new(),
            instrument: instrument.to_string(),
            mjd_obs,
            snr,
            release_date: None,
            ra: None,
            dec: None,
            collection: None,
            access_url: None,
        }
    }

    fn sample_records() -> Vec<SpectrumRecord> {
        vec![
            record("ADP.1", "HARPS", mjd(2004, 10, 1) + 0.3, Some(120.0)),
            record("ADP.2", "HARPS", mjd(2010, 5, 3) + 0.9, Some(12.0)),
            record("ADP.3", "FEROS", mjd(1989, 6, 1), Some(80.0)),
            record("ADP.4", "UVES", mjd(2015, 1, 1), None),
            record("ADP.5", "CRIRES", mjd(2016, 1, 1), Some(300.0)),
            record("ADP.6", "ESPRESSO", mjd(2019, 2, 28) + 0.99, Some(45.0)),
        ]
    }

    fn search_with(archive: LenientArchive, data_url: &str) -> StarSearch {
        StarSearch::new(
            Arc::new(archive),
            DownloadClient::new(Client::new(), data_url),
        )
    }

    fn lenient() -> LenientArchive {
        LenientArchive {
            records: sample_records(),
            counts: BTreeMap::from([("HARPS".to_string(), 40), ("UVES ".to_string(), 3)]),
            failing_target: None,
        }
    }

    fn ids(records: &[SpectrumRecord]) -> Vec<&str> {
        records.iter().map(|r| r.dataset_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_search_star_applies_default_filters() {
        let search = search_with(lenient(), "https://data.test/file");
        let records = search
            .search_star(&SearchCriteria::for_target("HD 10700"))
            .await
            .unwrap();
        // ADP.2 fails SNR, ADP.3 predates the default start, ADP.4 has no SNR,
        // ADP.5 is not a default instrument.
        assert_eq!(ids(&records), vec!["ADP.1", "ADP.6"]);
    }

    #[tokio::test]
    async fn test_search_by_instrument_only_returns_that_instrument() {
        let search = search_with(lenient(), "https://data.test/file");
        let records = search.search_by_instrument("HD 10700", "harps").await.unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.instrument == "HARPS"));
    }

    #[tokio::test]
    async fn test_search_by_date_is_inclusive_of_both_days() {
        let search = search_with(lenient(), "https://data.test/file");
        let dates = DateRange::between(
            NaiveDate::from_ymd_opt(2004, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 2, 28).unwrap(),
        )
        .unwrap();
        let records = search.search_by_date("HD 10700", None, dates).await.unwrap();
        assert_eq!(ids(&records), vec!["ADP.1", "ADP.6"]);
    }

    #[tokio::test]
    async fn test_search_by_snr_excludes_rows_without_snr() {
        let search = search_with(lenient(), "https://data.test/file");
        let records = search
            .search_by_snr("HD 10700", None, 10.0)
            .await
            .unwrap();
        assert!(records.iter().all(|r| r.snr.is_some_and(|s| s >= 10.0)));
        assert!(ids(&records).contains(&"ADP.2"));
        assert!(!ids(&records).contains(&"ADP.4"));
    }

    #[tokio::test]
    async fn test_search_star_rejects_empty_target() {
        let search = search_with(lenient(), "https://data.test/file");
        let result = search.search_star(&SearchCriteria::for_target("  ")).await;
        assert!(matches!(result, Err(ArchiveError::InvalidCriteria { .. })));
    }

    #[tokio::test]
    async fn test_search_instrument_spectra_lists_every_default_instrument() {
        let search = search_with(lenient(), "https://data.test/file");
        let counts = search
            .search_instrument_spectra("HD 10700", None)
            .await
            .unwrap();
        assert_eq!(counts.len(), DEFAULT_INSTRUMENTS.len());
        assert_eq!(counts["HARPS"], 1);
        assert_eq!(counts["ESPRESSO"], 1);
        assert_eq!(counts["FEROS"], 0);
    }

    #[tokio::test]
    async fn test_search_instrument_spectra_single_instrument() {
        let search = search_with(lenient(), "https://data.test/file");
        let counts = search
            .search_instrument_spectra("HD 10700", Some("espresso"))
            .await
            .unwrap();
        assert_eq!(counts, BTreeMap::from([("ESPRESSO".to_string(), 1)]));
    }

    #[tokio::test]
    async fn test_search_observation_dates_ignores_date_and_snr() {
        let search = search_with(lenient(), "https://data.test/file");
        let dates = search
            .search_observation_dates("HD 10700", Some("HARPS"))
            .await
            .unwrap();
        assert_eq!(dates.len(), 2);
    }

    #[tokio::test]
    async fn test_search_release_dates_skips_unreleased() {
        let mut archive = lenient();
        archive.records[0].release_date = Some("2005-10-01T00:00:00Z".to_string());
        archive.records[1].release_date = Some("  ".to_string());
        let search = search_with(archive, "https://data.test/file");

        let dates = search
            .search_star_dates("HD 10700", Some("HARPS"))
            .await
            .unwrap();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].release_date.as_deref(), Some("2005-10-01T00:00:00Z"));
        assert_eq!(dates[1].release_date, None);

        let released = search
            .search_release_dates("HD 10700", Some("HARPS"))
            .await
            .unwrap();
        assert_eq!(released, vec!["2005-10-01T00:00:00Z"]);
    }

    #[tokio::test]
    async fn test_search_targets_keeps_order_and_failures() {
        let archive = LenientArchive {
            failing_target: Some("BAD STAR"),
            ..lenient()
        };
        let search = search_with(archive, "https://data.test/file");
        let targets = vec![
            "HD 1".to_string(),
            "BAD STAR".to_string(),
            "HD 2".to_string(),
        ];
        let results = search
            .search_targets(&targets, &SearchCriteria::for_target(""))
            .await;

        let names: Vec<&str> = results.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(names, vec!["HD 1", "BAD STAR", "HD 2"]);
        assert!(results[0].result.is_ok());
        assert!(results[1].result.is_err());
        let second = results[2].result.as_ref().unwrap();
        assert!(second.iter().all(|r| r.target == "HD 2"));
    }

    #[tokio::test]
    async fn test_get_all_data_reports_missing_instruments() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"SIMPLE".to_vec()))
            .mount(&server)
            .await;

        let search = search_with(lenient(), &format!("{}/file", server.uri()));
        let mut events = 0;
        let outcomes = search
            .get_all_data(
                &SearchCriteria::for_target("HD 10700"),
                temp_dir.path(),
                false,
                |_| events += 1,
            )
            .await
            .unwrap();

        let summary: Vec<(&str, Option<usize>)> = outcomes
            .iter()
            .map(|o| (o.instrument(), o.report().map(DownloadReport::completed)))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("FEROS", None),
                ("UVES", Some(0)),
                ("HARPS", Some(1)),
                ("ESPRESSO", None),
            ]
        );
        assert_eq!(events, 1);
        assert!(temp_dir.path().join("ADP.1.fits").exists());
    }

    #[tokio::test]
    async fn test_get_data_single_instrument_without_observations() {
        let search = search_with(lenient(), "https://data.test/file");
        let temp_dir = TempDir::new().unwrap();
        let outcomes = search
            .get_data(
                &SearchCriteria::for_target("HD 10700").with_instrument("FEROS"),
                temp_dir.path(),
                false,
                |_| {},
            )
            .await
            .unwrap();
        assert!(matches!(
            outcomes.as_slice(),
            [InstrumentDownload::NoData { instrument }] if instrument == "FEROS"
        ));
    }

    #[tokio::test]
    async fn test_connect_anonymous_builds_client() {
        let search = StarSearch::connect(&ArchiveConfig::default(), None)
            .await
            .unwrap();
        assert!(
            search
                .downloader()
                .dataset_url("ADP.1")
                .unwrap()
                .as_str()
                .starts_with(DEFAULT_DATA_URL)
        );
    }
}
