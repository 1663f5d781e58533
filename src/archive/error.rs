//! Error types for archive queries.
//!
//! Every variant carries the context needed to act on it (endpoint URL,
//! target name, offending column) so callers can report failures without
//! re-deriving where they came from.

use thiserror::Error;

/// Errors that can occur while querying the ESO archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error querying {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout querying {url}")]
    Timeout {
        /// The endpoint that timed out.
        url: String,
    },

    /// The archive answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        /// The endpoint that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// First line of the response body, if any.
        message: String,
    },

    /// Login against the ESO single sign-on service was rejected.
    #[error("[AUTH] ESO login failed for user {user}: {reason}")]
    AuthFailed {
        /// The ESO user name.
        user: String,
        /// Why the login failed.
        reason: String,
    },

    /// A user was configured but no password could be found.
    #[error(
        "[AUTH] no password available for ESO user {user}\n  Suggestion: set STARSEARCH_PASSWORD or store it in the system keyring under service '{service}'"
    )]
    MissingPassword {
        /// The ESO user name.
        user: String,
        /// Keyring service name that was consulted.
        service: &'static str,
    },

    /// The result table could not be parsed.
    #[error("malformed result table from {url}: {reason}")]
    MalformedTable {
        /// The endpoint that produced the table.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Search criteria are unusable (empty target, inverted date range, ...).
    #[error("invalid search criteria: {reason}")]
    InvalidCriteria {
        /// What is wrong with the criteria.
        reason: String,
    },
}

impl ArchiveError {
    /// Creates a network error, promoting timeouts to [`ArchiveError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a login failure.
    pub fn auth_failed(user: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthFailed {
            user: user.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing-password error.
    pub fn missing_password(user: impl Into<String>, service: &'static str) -> Self {
        Self::MissingPassword {
            user: user.into(),
            service,
        }
    }

    /// Creates a malformed-table error.
    pub fn malformed_table(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-criteria error.
    pub fn invalid_criteria(reason: impl Into<String>) -> Self {
        Self::InvalidCriteria {
            reason: reason.into(),
        }
    }

    /// Returns true when the failure is an authentication problem.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthFailed { .. } | Self::MissingPassword { .. })
            || matches!(self, Self::HttpStatus { status: 401 | 403, .. })
    }
}
