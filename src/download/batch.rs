//! Sequential batch downloads of search results.
//!
//! Datasets are fetched one after another. A failed dataset is recorded in
//! the [`DownloadReport`] and the batch moves on to the next one.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::client::{DownloadClient, DownloadOutcome};
use super::error::DownloadError;
use crate::archive::SpectrumRecord;

/// Per-dataset progress event passed to the batch observer.
#[derive(Debug)]
pub struct BatchProgress<'a> {
    /// 1-based position of the dataset in the batch.
    pub position: usize,
    /// Number of datasets in the batch.
    pub total: usize,
    /// Dataset that was just processed.
    pub dataset_id: &'a str,
    /// What happened to it.
    pub result: &'a Result<DownloadOutcome, DownloadError>,
}

/// Result of a batch download.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Freshly written files.
    pub downloaded: Vec<PathBuf>,
    /// Files that were already present.
    pub skipped: Vec<PathBuf>,
    /// Datasets that could not be fetched.
    pub failed: Vec<(String, DownloadError)>,
    /// Total bytes written.
    pub bytes: u64,
}

impl DownloadReport {
    /// Number of datasets processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.skipped.len() + self.failed.len()
    }

    /// Number of datasets available locally after the batch.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.downloaded.len() + self.skipped.len()
    }

    /// Whether any dataset failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: DownloadReport) {
        self.downloaded.extend(other.downloaded);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
        self.bytes += other.bytes;
    }

    fn record(&mut self, dataset_id: &str, result: Result<DownloadOutcome, DownloadError>) {
        match result {
            Ok(DownloadOutcome::Downloaded { path, bytes }) => {
                self.bytes += bytes;
                self.downloaded.push(path);
            }
            Ok(DownloadOutcome::Skipped { path }) => self.skipped.push(path),
            Err(error) => self.failed.push((dataset_id.to_string(), error)),
        }
    }
}

/// Downloads every record's dataset into `output_dir`, in order.
///
/// `observer` is called after each dataset with its outcome.
pub async fn download_records<F>(
    client: &DownloadClient,
    records: &[SpectrumRecord],
    output_dir: &Path,
    overwrite: bool,
    mut observer: F,
) -> DownloadReport
where
    F: FnMut(BatchProgress<'_>),
{
    let mut report = DownloadReport::default();
    let total = records.len();

    for (index, record) in records.iter().enumerate() {
        let result = client
            .download_dataset(&record.dataset_id, output_dir, overwrite)
            .await;
        if let Err(error) = &result {
            warn!(dataset = %record.dataset_id, error = %error, "dataset download failed");
        }
        observer(BatchProgress {
            position: index + 1,
            total,
            dataset_id: &record.dataset_id,
            result: &result,
        });
        report.record(&record.dataset_id, result);
    }

    info!(
        downloaded = report.downloaded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        bytes = report.bytes,
        "batch finished"
    );
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqwest::Client;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(dataset_id: &str) -> SpectrumRecord {
        SpectrumRecord {
            dataset_id: dataset_id.to_string(),
            target: "HD 10700".to_string(),
            instrument: "HARPS".to_string(),
            mjd_obs: 53272.0,
            snr: Some(100.0),
            release_date: None,
            ra: None,
            dec: None,
            collection: None,
            access_url: None,
        }
    }

    #[tokio::test]
    async fn test_download_records_continues_after_failure() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/file/ADP.1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"one".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file/ADP.2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file/ADP.3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"three".to_vec()))
            .mount(&server)
            .await;

        let client = DownloadClient::new(Client::new(), format!("{}/file", server.uri()));
        let records = vec![record("ADP.1"), record("ADP.2"), record("ADP.3")];
        let mut positions = Vec::new();
        let report = download_records(&client, &records, temp_dir.path(), false, |p| {
            positions.push((p.position, p.total, p.result.is_ok()));
        })
        .await;

        assert_eq!(report.downloaded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "ADP.2");
        assert_eq!(report.bytes, 8);
        assert!(report.has_failures());
        assert_eq!(positions, vec![(1, 3, true), (2, 3, false), (3, 3, true)]);
    }

    #[tokio::test]
    async fn test_download_records_second_run_skips_everything() {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fits".to_vec()))
            .expect(2)
            .mount(&server)
            .await;

        let client = DownloadClient::new(Client::new(), format!("{}/file", server.uri()));
        let records = vec![record("ADP.1"), record("ADP.2")];
        let first = download_records(&client, &records, temp_dir.path(), false, |_| {}).await;
        let second = download_records(&client, &records, temp_dir.path(), false, |_| {}).await;

        assert_eq!(first.downloaded.len(), 2);
        assert_eq!(second.downloaded.len(), 0);
        assert_eq!(second.skipped.len(), 2);
        assert_eq!(second.completed(), 2);
    }

    #[test]
    fn test_report_merge_sums_counts() {
        let mut a = DownloadReport {
            downloaded: vec![PathBuf::from("a.fits")],
            bytes: 10,
            ..DownloadReport::default()
        };
        let b = DownloadReport {
            skipped: vec![PathBuf::from("b.fits")],
            failed: vec![("ADP.X".to_string(), DownloadError::timeout("u"))],
            bytes: 5,
            ..DownloadReport::default()
        };
        a.merge(b);
        assert_eq!(a.total(), 3);
        assert_eq!(a.completed(), 2);
        assert_eq!(a.bytes, 15);
    }
}
