//! Shared HTTP client construction for archive queries and downloads.
//!
//! Both the TAP client and the file downloader go through
//! [`build_http_client`] so they agree on timeouts, user agent, compression,
//! and proxy handling.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

/// Default HTTP connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (10 minutes; spectra tables and FITS files can be large).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 600;

/// Connect and read timeouts applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Connection establishment timeout, seconds.
    pub connect_secs: u64,
    /// Whole-request timeout, seconds.
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Builds the client shared by TAP queries, login and dataset downloads.
///
/// # Errors
///
/// Returns a message when reqwest rejects the configuration, or when the
/// system proxy lookup panics even with the env-proxy fallback.
pub fn build_http_client(user_agent: &str, timeouts: HttpTimeouts) -> Result<Client, String> {
    let attempt = match try_build_client(user_agent, timeouts, false) {
        Err(BuildFailure::ProxyPanic) => {
            // Restricted sandboxes can panic while reading system proxy settings.
            warn!("system proxy lookup panicked; retrying with proxies from the environment");
            try_build_client(user_agent, timeouts, true)
        }
        other => other,
    };
    attempt.map_err(|failure| match failure {
        BuildFailure::ProxyPanic => "HTTP client construction panicked".to_string(),
        BuildFailure::Build(error) => format!("HTTP client construction failed: {error}"),
    })
}

enum BuildFailure {
    ProxyPanic,
    Build(reqwest::Error),
}

fn try_build_client(
    user_agent: &str,
    timeouts: HttpTimeouts,
    env_proxies_only: bool,
) -> Result<Client, BuildFailure> {
    let user_agent = user_agent.to_string();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(user_agent, timeouts);
        if env_proxies_only {
            builder = with_env_proxies(builder.no_proxy());
        }
        builder.build().map_err(BuildFailure::Build)
    }))
    .map_err(|_| BuildFailure::ProxyPanic)?
}

fn base_builder(user_agent: String, timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent)
        .gzip(true)
}

fn with_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
