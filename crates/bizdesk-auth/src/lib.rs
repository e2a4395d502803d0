//! Session handling for bizdesk.
//!
//! This crate provides:
//! - [`SessionStore`]: the current user's session, hydrated from storage at
//!   construction and tracked by an explicit state machine
//! - [`RequestAuthorizer`]: the single place bearer credentials are attached
//!   to outbound requests
//! - [`RouteGuard`]: the check each view runs before rendering
//! - [`AuthClient`]: the `/auth/*` endpoints

mod authorizer;
mod client;
mod error;
mod guard;
pub mod http;
mod identity;
mod session;
pub mod session_fsm;

pub use authorizer::{CredentialSource, RequestAuthorizer};
pub use client::{AuthClient, LoginResponse};
pub use error::{AuthError, AuthResult};
pub use guard::{Navigation, Route, RouteGuard, SessionView};
pub use identity::{Identity, IdentityPatch};
pub use session::{SessionCallback, SessionSnapshot, SessionStore};
pub use session_fsm::{SessionChanged, SessionState};

use bizdesk_storage::SessionPersistence;
use std::sync::Arc;
use std::time::Duration;

/// Wire up persistence, authorizer, client and store from one API base URL.
pub fn create_session_store(
    persistence: Arc<SessionPersistence>,
    api_url: &str,
    timeout: Duration,
) -> AuthResult<Arc<SessionStore>> {
    let http_client = http::build_http_client(timeout)?;
    let authorizer = RequestAuthorizer::new(persistence.clone());
    let client = AuthClient::new(http_client, api_url, authorizer);
    Ok(Arc::new(SessionStore::new(persistence, client)))
}
