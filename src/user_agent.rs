//! User-Agent string shared by archive and download traffic.

/// Product token identifying the tool to the archive operators.
const PRODUCT_COMMENT: &str = "eso-archive-client";

/// Default User-Agent for all archive requests.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("starsearch/{version} ({PRODUCT_COMMENT})")
}
