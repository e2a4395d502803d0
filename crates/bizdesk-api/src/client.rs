//! Authorized REST client for the business endpoints.

use crate::models::{unwrap_list, AdviceRequest, AdviceResponse, ChatMessage};
use crate::{ApiError, ApiResult};
use bizdesk_auth::http::{endpoint_url, is_unauthorized_status, summarize_response_body};
use bizdesk_auth::{Identity, IdentityPatch, RequestAuthorizer};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

/// Client for clients, tasks, finance, advice and profile endpoints.
///
/// Every call goes through the [`RequestAuthorizer`]; nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    authorizer: RequestAuthorizer,
}

impl ApiClient {
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

    async fn call<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<String>
    where
        B: Serialize + ?Sized,
    {
        let url = endpoint_url(&self.base_url, path);
        debug!(method = %method, url = %url, "API request");

        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.authorizer.send(request).await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return Ok(text);
        }

        let body_summary = summarize_response_body(&text);
        if is_unauthorized_status(status) {
            warn!(method = %method, path, status = status.as_u16(), "API request unauthorized");
            return Err(ApiError::Unauthorized(format!(
                "HTTP {} ({})",
                status.as_u16(),
                body_summary
            )));
        }

        error!(
            method = %method,
            path,
            status = status.as_u16(),
            body_summary = %body_summary,
            "API error"
        );
        Err(ApiError::Api {
            status: status.as_u16(),
            message: format!("upstream error ({body_summary})"),
        })
    }

    async fn call_json<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let text = self.call(method, path, body).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{}: {} ({})", path, e, summarize_response_body(&text)))
        })
    }

    async fn get_json(&self, path: &str) -> ApiResult<Value> {
        self.call_json::<Value>(Method::GET, path, None).await
    }

    async fn get_list(&self, path: &str, key: &str) -> ApiResult<Vec<Value>> {
        let value = self.get_json(path).await?;
        unwrap_list(value, key)
            .ok_or_else(|| ApiError::InvalidResponse(format!("{path}: expected a list of {key}")))
    }

    // Clients

    /// `GET /clients`.
    pub async fn list_clients(&self) -> ApiResult<Vec<Value>> {
        self.get_list("clients", "clients").await
    }

    /// `GET /clients/{id}`.
    pub async fn get_client(&self, id: &str) -> ApiResult<Value> {
        self.get_json(&format!("clients/{id}")).await
    }

    /// `POST /clients`.
    pub async fn create_client(&self, record: &Value) -> ApiResult<Value> {
        self.call_json(Method::POST, "clients", Some(record)).await
    }

    /// `PUT /clients/{id}`.
    pub async fn update_client(&self, id: &str, record: &Value) -> ApiResult<Value> {
        self.call_json(Method::PUT, &format!("clients/{id}"), Some(record))
            .await
    }

    /// `DELETE /clients/{id}`.
    pub async fn delete_client(&self, id: &str) -> ApiResult<()> {
        self.call::<Value>(Method::DELETE, &format!("clients/{id}"), None)
            .await?;
        Ok(())
    }

    // Tasks

    /// `GET /tasks`.
    pub async fn list_tasks(&self) -> ApiResult<Vec<Value>> {
        self.get_list("tasks", "tasks").await
    }

    /// `POST /tasks`.
    pub async fn create_task(&self, record: &Value) -> ApiResult<Value> {
        self.call_json(Method::POST, "tasks", Some(record)).await
    }

    /// `PUT /tasks/{id}`.
    pub async fn update_task(&self, id: &str, record: &Value) -> ApiResult<Value> {
        self.call_json(Method::PUT, &format!("tasks/{id}"), Some(record))
            .await
    }

    /// `DELETE /tasks/{id}`.
    pub async fn delete_task(&self, id: &str) -> ApiResult<()> {
        self.call::<Value>(Method::DELETE, &format!("tasks/{id}"), None)
            .await?;
        Ok(())
    }

    /// `GET /finance/summary`.
    pub async fn finance_summary(&self) -> ApiResult<Value> {
        self.get_json("finance/summary").await
    }

    /// `POST /advice`: one chat turn. The caller owns `history` and appends
    /// both sides of the exchange itself.
    pub async fn ask_advice(&self, message: &str, history: &[ChatMessage]) -> ApiResult<String> {
        let request = AdviceRequest { message, history };
        let value = self
            .call_json(Method::POST, "advice", Some(&request))
            .await?;
        let reply: AdviceResponse = serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("advice: {e}")))?;
        Ok(reply.reply)
    }

    /// `PUT /auth/profile`. Returns the identity as the server now has it.
    pub async fn update_profile(&self, patch: &IdentityPatch) -> ApiResult<Identity> {
        let text = self
            .call(Method::PUT, "auth/profile", Some(patch))
            .await?;
        Identity::from_payload(&text).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "auth/profile: {} ({})",
                e,
                summarize_response_body(&text)
            ))
        })
    }
}
