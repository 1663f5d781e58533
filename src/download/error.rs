//! Failures of a single dataset retrieval.

use std::path::PathBuf;

use thiserror::Error;

/// Why a dataset could not be fetched from the data portal.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The data portal could not be reached.
    #[error("network error fetching {url}: {source}")]
    Network {
        /// Dataset URL.
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The portal stopped answering within the read timeout.
    #[error("timeout fetching {url}")]
    Timeout {
        /// Dataset URL.
        url: String,
    },

    /// The portal answered with a non-success status other than 401/403.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// Dataset URL.
        url: String,
        /// Response status.
        status: u16,
    },

    /// The output directory or file could not be written.
    #[error("cannot write {path}: {source}")]
    Io {
        /// Local path being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data portal base URL cannot take a dataset id.
    #[error("invalid data portal URL: {url}")]
    InvalidUrl {
        /// Configured base URL.
        url: String,
    },

    /// Fewer or more bytes arrived than `Content-Length` announced.
    #[error("truncated download of {path}: expected {expected_bytes} bytes, got {actual_bytes}")]
    Integrity {
        /// Final path the dataset was meant for.
        path: PathBuf,
        /// Announced length.
        expected_bytes: u64,
        /// Bytes received.
        actual_bytes: u64,
    },

    /// The dataset is still proprietary or the token was rejected.
    #[error("[AUTH] access denied (HTTP {status}) fetching {url}\n  Suggestion: {suggestion}")]
    AuthRequired {
        /// Dataset URL.
        url: String,
        /// 401 or 403.
        status: u16,
        /// What the user can do about it.
        suggestion: &'static str,
    },
}

impl DownloadError {
    /// Wraps a transport error; reqwest timeouts become [`DownloadError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    pub fn integrity(path: impl Into<PathBuf>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::Integrity {
            path: path.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Access denied by the portal.
    ///
    /// Anonymous requests are told to log in; authenticated ones that the
    /// account has no rights to the dataset yet.
    pub fn auth_required(url: impl Into<String>, status: u16, had_token: bool) -> Self {
        let suggestion = if had_token {
            "The logged-in ESO account has no access to this dataset yet (proprietary period)."
        } else {
            "Pass --user <ESO user> to download proprietary data."
        };
        Self::AuthRequired {
            url: url.into(),
            status,
            suggestion,
        }
    }
}
