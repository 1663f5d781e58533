//! Canned ESO archive responses.

use std::fmt::Write as _;

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const SPECTRA_HEADER: &str = "dp_id,target_name,instrument_name,t_min,snr,obs_release_date,s_ra,s_dec,obs_collection,access_url";

pub const FITS_BYTES: &[u8] = b"SIMPLE  =                    T";

/// Matches TAP requests whose ADQL contains `self.0`.
pub struct QueryContains(pub &'static str);

impl Match for QueryContains {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .any(|(key, value)| key == "QUERY" && value.contains(self.0))
    }
}

/// One row of a spectra table. An empty `snr` leaves the column blank.
pub fn spectrum_row(dataset_id: &str, instrument: &str, mjd: f64, snr: &str) -> String {
    format!(
        "{dataset_id},HD 10700,{instrument},{mjd},{snr},2005-01-01T00:00:00Z,26.02,-15.94,{instrument},"
    )
}

pub fn spectra_csv(rows: &[String]) -> String {
    let mut body = format!("{SPECTRA_HEADER}\n");
    for row in rows {
        let _ = writeln!(body, "{row}");
    }
    body
}

pub fn counts_csv(counts: &[(&str, usize)]) -> String {
    let mut body = String::from("instrument,n\n");
    for (instrument, n) in counts {
        let _ = writeln!(body, "{instrument},{n}");
    }
    body
}

/// Answers spectrum queries containing `fragment` with `body`.
pub async fn mount_spectra(server: &MockServer, fragment: &'static str, body: String) {
    Mock::given(method("GET"))
        .and(path("/tap_obs/sync"))
        .and(QueryContains("ivoa.ObsCore"))
        .and(QueryContains(fragment))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Answers raw observation count queries.
pub async fn mount_counts(server: &MockServer, counts: &[(&str, usize)]) {
    Mock::given(method("GET"))
        .and(path("/tap_obs/sync"))
        .and(QueryContains("dbo.raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string(counts_csv(counts)))
        .mount(server)
        .await;
}

/// Serves a small FITS header for every dataset.
pub async fn mount_files(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/file/.+"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FITS_BYTES))
        .mount(server)
        .await;
}

pub fn tap_url(server: &MockServer) -> String {
    format!("{}/tap_obs", server.uri())
}

pub fn data_url(server: &MockServer) -> String {
    format!("{}/file", server.uri())
}
