//! HTTP client for the authentication endpoints.

use crate::http::{endpoint_url, is_unauthorized_status, summarize_response_body};
use crate::{AuthError, AuthResult, Identity, RequestAuthorizer};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: Identity,
}

/// Client for `/auth/*`. All requests go through the [`RequestAuthorizer`].
#[derive(Debug, Clone)]
pub struct AuthClient {
    http_client: Client,
    base_url: String,
    authorizer: RequestAuthorizer,
}

impl AuthClient {
    pub fn new(http_client: Client, base_url: &str, authorizer: RequestAuthorizer) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorizer,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn authorizer(&self) -> &RequestAuthorizer {
        &self.authorizer
    }

    /// `POST /auth/login`.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginResponse> {
        let url = endpoint_url(&self.base_url, "auth/login");
        debug!(url = %url, "Sending login request");

        let request = self
            .http_client
            .post(&url)
            .json(&LoginRequest { email, password });
        let response = self.authorizer.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "Login rejected");

            if is_unauthorized_status(status) || status.as_u16() == 400 {
                return Err(AuthError::InvalidCredentials(format!(
                    "HTTP {} ({})",
                    status.as_u16(),
                    body_summary
                )));
            }
            return Err(AuthError::Server {
                status: status.as_u16(),
                message: format!("login failed ({body_summary})"),
            });
        }

        let body = response.text().await?;
        let login: LoginResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::InvalidResponse(format!(
                "login response: {} ({})",
                e,
                summarize_response_body(&body)
            ))
        })?;

        if login.token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "login response carried an empty token".to_string(),
            ));
        }

        Ok(login)
    }

    /// `GET /auth/me` with the stored credential.
    pub async fn current_user(&self) -> AuthResult<Identity> {
        let url = endpoint_url(&self.base_url, "auth/me");
        debug!(url = %url, "Verifying session with server");

        let response = self.authorizer.send(self.http_client.get(&url)).await?;
        self.read_identity(response, "session check").await
    }

    async fn read_identity(&self, response: reqwest::Response, what: &str) -> AuthResult<Identity> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "{} failed", what);

            if is_unauthorized_status(status) {
                return Err(AuthError::SessionRejected(format!(
                    "HTTP {} ({})",
                    status.as_u16(),
                    body_summary
                )));
            }
            return Err(AuthError::Server {
                status: status.as_u16(),
                message: format!("{what} failed ({body_summary})"),
            });
        }

        let body = response.text().await?;
        Identity::from_payload(&body).map_err(|e| {
            AuthError::InvalidResponse(format!(
                "{what} response: {} ({})",
                e,
                summarize_response_body(&body)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_accepts_access_token_alias() {
        let parsed: LoginResponse = serde_json::from_value(json!({
            "access_token": "tok",
            "user": { "name": "Ana", "email": "ana@shop.test" }
        }))
        .unwrap();
        assert_eq!(parsed.token, "tok");
        assert_eq!(parsed.user.email, "ana@shop.test");
    }
}
