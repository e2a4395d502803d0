//! Request authorizer.
//!
//! Every outbound API request passes through [`RequestAuthorizer`], which
//! reads the current credential from persistent storage at send time and
//! attaches it as a bearer token. Responses are returned untouched: there is
//! no retry, refresh or queuing here.

use crate::AuthResult;
use bizdesk_storage::{SessionPersistence, StorageResult};
use reqwest::{RequestBuilder, Response};
use std::sync::Arc;
use tracing::trace;

/// Something that can report the current bearer credential.
pub trait CredentialSource: Send + Sync {
    /// The credential to attach, or `None` to send the request bare.
    fn current_credential(&self) -> StorageResult<Option<String>>;
}

impl CredentialSource for SessionPersistence {
    fn current_credential(&self) -> StorageResult<Option<String>> {
        self.get_token()
    }
}

/// Attaches the persisted credential to outbound requests.
#[derive(Clone)]
pub struct RequestAuthorizer {
    source: Arc<dyn CredentialSource>,
}

impl RequestAuthorizer {
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self { source }
    }

    /// Add `Authorization: Bearer <token>` when a non-empty token is stored.
    ///
    /// A storage read failure is returned and the request is not sent.
    pub fn authorize(&self, request: RequestBuilder) -> AuthResult<RequestBuilder> {
        match self.source.current_credential()? {
            Some(token) if !token.is_empty() => {
                trace!("Attaching bearer credential");
                Ok(request.bearer_auth(token))
            }
            _ => {
                trace!("No credential stored, sending request without authorization");
                Ok(request)
            }
        }
    }

    /// Authorize and send.
    pub async fn send(&self, request: RequestBuilder) -> AuthResult<Response> {
        let response = self.authorize(request)?.send().await?;
        Ok(response)
    }
}

impl std::fmt::Debug for RequestAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthorizer").finish_non_exhaustive()
    }
}
