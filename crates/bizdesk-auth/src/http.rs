//! Small HTTP helpers shared by the auth and API clients.

use reqwest::StatusCode;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Build the shared HTTP client with a per-request timeout.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bizdesk/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join an endpoint path onto the API base URL.
///
/// `Url::join` would drop the last segment of a base without a trailing
/// slash (`/api` + `clients` -> `/clients`), so this concatenates instead.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Describe a response body without echoing it, so server error pages and
/// stray tokens never reach logs or error messages.
pub fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// 401 and 403 both mean the credential is not accepted.
pub fn is_unauthorized_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
