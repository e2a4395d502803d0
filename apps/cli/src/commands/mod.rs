//! CLI command implementations.
//!
//! Each view calls [`AppContext::enter`] before doing anything else, and
//! routes API failures through [`AppContext::api_failure`], so an
//! unauthenticated user always ends up at the login hint.

mod advice;
mod auth;
mod clients;
mod dashboard;
mod finance;
mod profile;
mod tasks;

pub use advice::advice;
pub use auth::{login, logout, status};
pub use clients::{ClientFields, clients_add, clients_list, clients_remove, clients_show, clients_update};
pub use dashboard::dashboard;
pub use finance::finance;
pub use profile::{profile_show, profile_update};
pub use tasks::{TaskFields, tasks_add, tasks_list, tasks_remove, tasks_update};

use crate::output::{self, OutputFormat};
use anyhow::Result;
use bizdesk_api::{ApiClient, ApiError};
use bizdesk_auth::http::build_http_client;
use bizdesk_auth::{AuthClient, Navigation, RequestAuthorizer, Route, RouteGuard, SessionStore};
use bizdesk_config::{Config, Paths};
use bizdesk_storage::create_session_persistence;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A guard decision that keeps a view from rendering.
#[derive(Debug, thiserror::Error)]
#[error("redirected to {to} from {from}")]
pub struct Redirect {
    pub to: Route,
    pub from: Route,
}

impl Redirect {
    /// Tell the user where to go next.
    pub fn print(&self, format: &OutputFormat) {
        match format {
            OutputFormat::Text => match self.to {
                Route::Login => eprintln!(
                    "Not logged in. Run 'bizdesk login' to open {}.",
                    self.from
                ),
                to => eprintln!("Nothing to do here. Continue with 'bizdesk {}'.", to),
            },
            OutputFormat::Json => eprintln!(
                "{}",
                json!({ "status": "redirect", "to": self.to, "from": self.from })
            ),
        }
    }
}

/// Everything a view needs: config, the session store and the API client.
pub struct AppContext {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub api: ApiClient,
    pub format: OutputFormat,
}

impl AppContext {
    /// Hydrate the session from disk and wire the clients to one
    /// authorizer.
    pub async fn load(paths: &Paths, config: Config, format: OutputFormat) -> Result<Self> {
        let persistence = Arc::new(create_session_persistence(paths)?);
        let http_client = build_http_client(config.request_timeout())?;
        let authorizer = RequestAuthorizer::new(persistence.clone());

        let auth_client = AuthClient::new(http_client.clone(), &config.api_url, authorizer.clone());
        let session = Arc::new(SessionStore::new(persistence, auth_client));
        debug!(state = ?session.state(), "Session hydrated");

        if config.revalidate_on_startup && session.current_identity().is_some() {
            match session.revalidate().await {
                Ok(identity) => debug!(email = %identity.email, "Stored session still valid"),
                Err(e) if e.is_unauthorized() => info!("Stored session rejected by server"),
                Err(e) => warn!(error = %e, "Could not verify stored session"),
            }
        }

        let api = ApiClient::new(http_client, &config.api_url, authorizer);

        Ok(Self {
            config,
            session,
            api,
            format,
        })
    }

    /// Run the route guard. `Ok` means the view may render.
    pub fn enter(&self, route: Route) -> Result<()> {
        match RouteGuard::resolve(route, &*self.session) {
            Navigation::Render(_) => Ok(()),
            Navigation::Redirect { to, from } => Err(Redirect { to, from }.into()),
            Navigation::Pending => anyhow::bail!("Session is still loading"),
        }
    }

    /// Turn an API failure seen by `route` into the error the view returns.
    pub fn api_failure(&self, route: Route, err: ApiError) -> anyhow::Error {
        if err.is_unauthorized() {
            warn!(route = %route, error = %err, "API rejected the session");
            if let Navigation::Redirect { to, from } = RouteGuard::on_rejected(route) {
                return Redirect { to, from }.into();
            }
        }
        err.into()
    }

    pub fn success(&self, message: &str) {
        output::print_success(message, &self.format);
    }
}

/// Build a JSON object from the fields that were given.
pub(crate) fn record_from(fields: Vec<(&str, Option<Value>)>) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect();
    Value::Object(map)
}

/// Like [`record_from`], but refuses to send an empty update.
pub(crate) fn update_from(fields: Vec<(&str, Option<Value>)>) -> Result<Value> {
    let record = record_from(fields);
    if record.as_object().is_some_and(Map::is_empty) {
        anyhow::bail!("Nothing to update: pass at least one field");
    }
    Ok(record)
}

/// Pick the id out of a created record for display.
pub(crate) fn record_id(record: &Value) -> String {
    match record.get("id").or_else(|| record.get("_id")) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => "-".to_string(),
    }
}
