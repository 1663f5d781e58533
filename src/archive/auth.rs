//! ESO single sign-on login.
//!
//! Anonymous access covers all public data. Logging in yields an OpenID
//! Connect `id_token` that is sent as a bearer token with every later
//! request, which unlocks proprietary data the account has rights to.

use std::env;
use std::panic::{AssertUnwindSafe, catch_unwind};

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use super::ArchiveError;

/// Default ESO OpenID Connect token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://www.eso.org/sso/oidc/token";

/// Environment variable consulted first for the account password.
pub const PASSWORD_ENV_VAR: &str = "STARSEARCH_PASSWORD";

/// Keyring service the password is looked up under (entry name = user).
pub const KEYRING_SERVICE: &str = "starsearch";

/// Client id the ESO portal expects for password grants.
const OIDC_CLIENT_ID: &str = "clientid";

/// An ESO portal account.
#[derive(Clone)]
pub struct Credentials {
    /// ESO user name.
    pub user: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Credentials with an explicit password.
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Looks up the password for `user` in the environment, then the keyring.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::MissingPassword`] if neither source has one.
    pub fn lookup(user: &str) -> Result<Self, ArchiveError> {
        if let Some(password) = env::var(PASSWORD_ENV_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            debug!(user, "using ESO password from environment");
            return Ok(Self::new(user, password));
        }

        match keyring_password(user) {
            Some(password) => {
                debug!(user, "using ESO password from keyring");
                Ok(Self::new(user, password))
            }
            None => Err(ArchiveError::missing_password(user, KEYRING_SERVICE)),
        }
    }
}

fn keyring_password(user: &str) -> Option<String> {
    let entry = catch_unwind(|| keyring::Entry::new(KEYRING_SERVICE, user))
        .ok()?
        .ok()?;
    catch_unwind(AssertUnwindSafe(|| entry.get_password()))
        .ok()?
        .ok()
        .filter(|p| !p.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchanges credentials for an ESO `id_token`.
///
/// # Errors
///
/// Returns [`ArchiveError::AuthFailed`] when the portal rejects the login or
/// answers without a token, and network errors otherwise.
#[instrument(skip(client, credentials), fields(user = %credentials.user))]
pub async fn fetch_token(
    client: &Client,
    token_url: &str,
    credentials: &Credentials,
) -> Result<String, ArchiveError> {
    let url = Url::parse_with_params(
        token_url,
        [
            ("response_type", "id_token token"),
            ("grant_type", "password"),
            ("client_id", OIDC_CLIENT_ID),
            ("username", credentials.user.as_str()),
            ("password", credentials.password.as_str()),
        ],
    )
    .map_err(|e| ArchiveError::auth_failed(&credentials.user, format!("bad token URL: {e}")))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ArchiveError::network(token_url, e.without_url()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ArchiveError::network(token_url, e.without_url()))?;
    let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();

    if !status.is_success() {
        let reason = parsed
            .and_then(|t| t.error_description.or(t.error))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Err(ArchiveError::auth_failed(&credentials.user, reason));
    }

    let token = parsed
        .and_then(|t| t.id_token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ArchiveError::auth_failed(&credentials.user, "token response had no id_token")
        })?;

    info!(user = %credentials.user, "logged in to ESO archive");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("jdoe", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("jdoe"));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_fetch_token_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sso/oidc/token"))
            .and(query_param("grant_type", "password"))
            .and(query_param("username", "jdoe"))
            .and(query_param("client_id", "clientid"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"id_token":"abc.def.ghi","access_token":"x"}"#),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/sso/oidc/token", server.uri());
        let token = fetch_token(&client, &url, &Credentials::new("jdoe", "pw"))
            .await
            .unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[tokio::test]
    async fn test_fetch_token_rejected_login() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sso/oidc/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error":"invalid_grant","error_description":"Invalid user credentials"}"#,
            ))
            .mount(&server)
            .await;

        let client = Client::new();
        let url = format!("{}/sso/oidc/token", server.uri());
        let err = fetch_token(&client, &url, &Credentials::new("jdoe", "bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::AuthFailed { .. }));
        assert!(err.to_string().contains("Invalid user credentials"), "{err}");
    }

    #[tokio::test]
    async fn test_fetch_token_network_error_hides_password() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{port}/sso/oidc/token");

        let err = fetch_token(&Client::new(), &url, &Credentials::new("jdoe", "hunter2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Network { .. } | ArchiveError::Timeout { .. }
        ));
        let rendered = format!("{:#}", anyhow::Error::from(err));
        assert!(rendered.contains("/sso/oidc/token"), "{rendered}");
        assert!(!rendered.contains("hunter2"), "password leaked: {rendered}");
    }

    #[tokio::test]
    async fn test_fetch_token_missing_id_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = Client::new();
        let err = fetch_token(&client, &server.uri(), &Credentials::new("jdoe", "pw"))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }
}
