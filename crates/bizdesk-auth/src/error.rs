//! Authentication error types.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The server refused the email/password pair
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// No session
    #[error("Not logged in")]
    NotLoggedIn,

    /// The server no longer accepts the stored credential
    #[error("Session rejected by server: {0}")]
    SessionRejected(String),

    /// Non-auth failure from the authentication endpoints
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] bizdesk_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns true if this error means the caller has no usable session
    /// and should be sent to the login view.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials(_) | AuthError::NotLoggedIn | AuthError::SessionRejected(_)
        )
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
