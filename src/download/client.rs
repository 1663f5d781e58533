//! HTTP client wrapper for downloading archive datasets.
//!
//! This module provides the `DownloadClient` struct which streams datasets
//! from the ESO data portal to disk.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::error::DownloadError;
use super::filename::{dataset_filename, partial_path};

/// Default ESO data portal file endpoint.
pub const DEFAULT_DATA_URL: &str = "https://dataportal.eso.org/dataportal_new/file";

/// What happened to a single dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was fetched and written.
    Downloaded {
        /// Final output path.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// A non-empty file with the target name already existed.
    Skipped {
        /// The existing file.
        path: PathBuf,
    },
}

impl DownloadOutcome {
    /// Local path of the dataset, whether fetched or already present.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded { path, .. } | Self::Skipped { path } => path,
        }
    }
}

/// HTTP client for downloading datasets with streaming support.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use starsearch_core::download::{DownloadClient, DEFAULT_DATA_URL};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DownloadClient::new(reqwest::Client::new(), DEFAULT_DATA_URL);
/// let outcome = client
///     .download_dataset("ADP.2014-09-16T11:03:30.727", Path::new("./spectra"), false)
///     .await?;
/// println!("Saved to: {}", outcome.path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    data_url: String,
    token: Option<String>,
}

impl DownloadClient {
    /// Creates a client fetching datasets from `data_url/<dataset id>`.
    #[must_use]
    pub fn new(client: Client, data_url: impl Into<String>) -> Self {
        Self {
            client,
            data_url: data_url.into(),
            token: None,
        }
    }

    /// Sends `token` as a bearer token with every download.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// URL of a dataset on the data portal.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if the base URL cannot carry a path.
    pub fn dataset_url(&self, dataset_id: &str) -> Result<Url, DownloadError> {
        let mut url =
            Url::parse(&self.data_url).map_err(|_| DownloadError::invalid_url(&self.data_url))?;
        url.path_segments_mut()
            .map_err(|()| DownloadError::invalid_url(&self.data_url))?
            .pop_if_empty()
            .push(dataset_id.trim());
        Ok(url)
    }

    /// Downloads a dataset into `output_dir`.
    ///
    /// The file is named after the dataset id (see [`dataset_filename`]). An
    /// existing non-empty file is left alone unless `overwrite` is set. Data
    /// is streamed to a `.part` file that is renamed once complete, so an
    /// interrupted download never looks finished.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    #[instrument(skip(self), fields(dataset = %dataset_id))]
    pub async fn download_dataset(
        &self,
        dataset_id: &str,
        output_dir: &Path,
        overwrite: bool,
    ) -> Result<DownloadOutcome, DownloadError> {
        let file_path = output_dir.join(dataset_filename(dataset_id));

        if !overwrite
            && let Ok(meta) = tokio::fs::metadata(&file_path).await
            && meta.is_file()
            && meta.len() > 0
        {
            debug!(path = %file_path.display(), "dataset already present, skipping");
            return Ok(DownloadOutcome::Skipped { path: file_path });
        }

        let url = self.dataset_url(dataset_id)?;
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| DownloadError::io(output_dir, e))?;

        let response = self.send_request(url.as_str()).await?;
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let part_path = partial_path(&file_path);
        let mut file = File::create(&part_path)
            .await
            .map_err(|e| DownloadError::io(part_path.clone(), e))?;

        // Stream response body to the partial file, with cleanup on error
        let stream_result = stream_to_file(&mut file, response, url.as_str(), &part_path).await;
        drop(file);

        let bytes_written = match stream_result {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %part_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(error);
            }
        };

        if let Some(expected) = content_length
            && expected != bytes_written
        {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(DownloadError::integrity(
                file_path,
                expected,
                bytes_written,
            ));
        }

        tokio::fs::rename(&part_path, &file_path)
            .await
            .map_err(|e| DownloadError::io(file_path.clone(), e))?;

        info!(path = %file_path.display(), bytes = bytes_written, "download complete");
        Ok(DownloadOutcome::Downloaded {
            path: file_path,
            bytes: bytes_written,
        })
    }

    async fn send_request(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            if matches!(status_code, 401 | 403) {
                return Err(DownloadError::auth_required(
                    url,
                    status_code,
                    self.token.is_some(),
                ));
            }
            return Err(DownloadError::http_status(url, status_code));
        }

        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
