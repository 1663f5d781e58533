//! Synchronous TAP queries against the ESO archive.
//!
//! Queries are sent as `GET {tap_url}/sync` with the ADQL in the `QUERY`
//! parameter and results requested as CSV. Service-side failures come back
//! as a VOTable document with a `QUERY_STATUS` of `ERROR`; those are mapped
//! to [`ArchiveError::HttpStatus`] with the service message attached.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::adql::{instrument_count_query, spectra_query};
use super::criteria::SearchCriteria;
use super::record::{SpectrumRecord, parse_count_table, parse_spectrum_table};
use super::{Archive, ArchiveError};

/// Default ESO TAP endpoint for observation data.
pub const DEFAULT_TAP_URL: &str = "https://archive.eso.org/tap_obs";

/// TAP archive client.
#[derive(Debug, Clone)]
pub struct TapArchive {
    client: Client,
    tap_url: String,
    token: Option<String>,
    max_rows: Option<u64>,
}

impl TapArchive {
    /// Creates a client for the TAP service rooted at `tap_url`.
    #[must_use]
    pub fn new(client: Client, tap_url: impl Into<String>) -> Self {
        Self {
            client,
            tap_url: tap_url.into().trim_end_matches('/').to_string(),
            token: None,
            max_rows: None,
        }
    }

    /// Sends `token` as a bearer token with every query.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Caps the number of rows the service returns. `None` means unlimited.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: Option<u64>) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// The synchronous query endpoint.
    #[must_use]
    pub fn sync_url(&self) -> String {
        format!("{}/sync", self.tap_url)
    }

    /// Runs an ADQL query and returns the CSV body.
    ///
    /// # Errors
    ///
    /// Network failures, non-success statuses, and service-reported query
    /// errors.
    #[instrument(skip(self), fields(endpoint = %self.sync_url()))]
    pub async fn run_query(&self, adql: &str) -> Result<String, ArchiveError> {
        let endpoint = self.sync_url();
        let max_rows = self.max_rows.map(|n| n.to_string());
        let mut params = vec![
            ("REQUEST", "doQuery"),
            ("LANG", "ADQL"),
            ("FORMAT", "csv"),
            ("QUERY", adql),
        ];
        if let Some(max_rows) = max_rows.as_deref() {
            params.push(("MAXREC", max_rows));
        }
        let url = Url::parse_with_params(&endpoint, &params).map_err(|e| {
            ArchiveError::invalid_criteria(format!("bad TAP endpoint '{endpoint}': {e}"))
        })?;

        debug!(%adql, "submitting TAP query");
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ArchiveError::network(&endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ArchiveError::network(&endpoint, e))?;

        if !status.is_success() {
            let message = votable_error(&body)
                .unwrap_or_else(|| body.lines().next().unwrap_or_default().trim().to_string());
            return Err(ArchiveError::http_status(endpoint, status.as_u16(), message));
        }
        if let Some(message) = votable_error(&body) {
            return Err(ArchiveError::http_status(endpoint, status.as_u16(), message));
        }

        debug!(bytes = body.len(), "TAP query answered");
        Ok(body)
    }
}

#[async_trait]
impl Archive for TapArchive {
    async fn search_spectra(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<SpectrumRecord>, ArchiveError> {
        criteria.validate()?;
        let body = self.run_query(&spectra_query(criteria)).await?;
        parse_spectrum_table(&body, &self.sync_url())
    }

    async fn instrument_counts(&self, target: &str) -> Result<BTreeMap<String, usize>, ArchiveError> {
        if target.trim().is_empty() {
            return Err(ArchiveError::invalid_criteria("target name is empty"));
        }
        let body = self.run_query(&instrument_count_query(target)).await?;
        let rows = parse_count_table(&body, &self.sync_url())?;
        let mut counts = BTreeMap::new();
        for (instrument, n) in rows {
            *counts.entry(instrument.trim().to_string()).or_insert(0) += n;
        }
        Ok(counts)
    }
}

/// Extracts the message of a VOTable `QUERY_STATUS` error, if the body is one.
fn votable_error(body: &str) -> Option<String> {
    let head = body.trim_start();
    if !(head.starts_with("<?xml") || head.starts_with("<VOTABLE")) {
        return None;
    }
    let info_start = body.find("name=\"QUERY_STATUS\"")?;
    let tag = &body[info_start..];
    let tag_end = tag.find('>')?;
    if !tag[..tag_end].contains("value=\"ERROR\"") {
        return None;
    }
    let rest = &tag[tag_end + 1..];
    let message = rest.split("</INFO>").next().unwrap_or_default().trim();
    Some(if message.is_empty() {
        "query failed".to_string()
    } else {
        message.to_string()
    })
}
