//! Errors raised while setting up an archive session.

use thiserror::Error;

use crate::archive::ArchiveError;

/// Errors that can occur while connecting to the archive.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The shared HTTP client could not be constructed.
    #[error("failed to initialize HTTP client: {reason}")]
    HttpClient {
        /// Builder failure message.
        reason: String,
    },

    /// Logging in to the ESO archive failed.
    #[error(transparent)]
    Login(#[from] ArchiveError),
}

impl ConnectError {
    /// Creates an HTTP client construction error.
    pub fn http_client(reason: impl Into<String>) -> Self {
        Self::HttpClient {
            reason: reason.into(),
        }
    }
}
