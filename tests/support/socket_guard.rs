use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "STARSEARCH_REQUIRE_SOCKET_TESTS";

fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Whether wiremock can listen on localhost.
///
/// Sandboxes without loopback networking skip the test unless
/// `STARSEARCH_REQUIRE_SOCKET_TESTS` is set, in which case the test fails.
#[track_caller]
pub fn socket_available() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return true;
    }

    let location = Location::caller();
    let message = format!(
        "cannot bind a localhost socket for the mock archive ({}:{})",
        location.file(),
        location.line()
    );
    assert!(!socket_tests_required(), "{message}; {REQUIRE_ENV} is set");
    eprintln!("{message}; skipping");
    false
}

/// Starts a mock server, or returns `None` when the test should be skipped.
pub async fn mock_server() -> Option<MockServer> {
    if socket_available() {
        Some(MockServer::start().await)
    } else {
        None
    }
}
