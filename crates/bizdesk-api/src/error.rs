//! Error types for the business API client.

use bizdesk_auth::AuthError;
use thiserror::Error;

/// Errors from API calls.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered 401 or 403
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-2xx answer
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be authorized (credential unreadable)
    #[error("Authorization failed: {0}")]
    Auth(#[source] AuthError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// True when the view should send the user back to the login view.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) => true,
            ApiError::Auth(e) => e.is_unauthorized(),
            _ => false,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Http(e) => ApiError::Http(e),
            other => ApiError::Auth(other),
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
