//! Client management commands.

use super::{record_from, record_id, update_from, AppContext};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use bizdesk_auth::Route;
use serde_json::json;

/// Fields accepted by `clients add` and `clients update`.
#[derive(Debug, Default, clap::Args)]
pub struct ClientFields {
    /// Client or business name
    #[arg(long)]
    pub name: Option<String>,
    /// Contact email
    #[arg(long)]
    pub email: Option<String>,
    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,
    /// Company the contact belongs to
    #[arg(long)]
    pub company: Option<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl ClientFields {
    fn into_fields(self) -> Vec<(&'static str, Option<serde_json::Value>)> {
        vec![
            ("name", self.name.map(|v| json!(v))),
            ("email", self.email.map(|v| json!(v))),
            ("phone", self.phone.map(|v| json!(v))),
            ("company", self.company.map(|v| json!(v))),
            ("notes", self.notes.map(|v| json!(v))),
        ]
    }
}

/// List clients.
pub async fn clients_list(ctx: &AppContext) -> Result<()> {
    ctx.enter(Route::Clients)?;

    let clients = ctx
        .api
        .list_clients()
        .await
        .map_err(|e| ctx.api_failure(Route::Clients, e))?;

    match ctx.format {
        OutputFormat::Text => output::print_table(
            &clients,
            &[
                ("ID", "id", 8),
                ("Name", "name", 28),
                ("Email", "email", 30),
                ("Phone", "phone", 16),
            ],
            "No clients found",
        ),
        OutputFormat::Json => output::print_json(&clients),
    }
    Ok(())
}

/// Show one client.
pub async fn clients_show(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.enter(Route::Clients)?;

    let client = ctx
        .api
        .get_client(id)
        .await
        .map_err(|e| ctx.api_failure(Route::Clients, e))?;

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading(&format!("Client {}", id));
            output::print_record(&client);
        }
        OutputFormat::Json => output::print_json(&client),
    }
    Ok(())
}

/// Add a client. `name` is required.
pub async fn clients_add(ctx: &AppContext, fields: ClientFields) -> Result<()> {
    ctx.enter(Route::Clients)?;

    if fields.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        anyhow::bail!("A client needs a name (--name)");
    }
    let record = record_from(fields.into_fields());

    let created = ctx
        .api
        .create_client(&record)
        .await
        .map_err(|e| ctx.api_failure(Route::Clients, e))?;

    match ctx.format {
        OutputFormat::Text => ctx.success(&format!("Client added: {}", record_id(&created))),
        OutputFormat::Json => output::print_json(&created),
    }
    Ok(())
}

/// Update the given fields of a client.
pub async fn clients_update(ctx: &AppContext, id: &str, fields: ClientFields) -> Result<()> {
    ctx.enter(Route::Clients)?;

    let record = update_from(fields.into_fields())?;
    let updated = ctx
        .api
        .update_client(id, &record)
        .await
        .map_err(|e| ctx.api_failure(Route::Clients, e))?;

    match ctx.format {
        OutputFormat::Text => ctx.success(&format!("Client updated: {}", id)),
        OutputFormat::Json => output::print_json(&updated),
    }
    Ok(())
}

/// Remove a client.
pub async fn clients_remove(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.enter(Route::Clients)?;

    ctx.api
        .delete_client(id)
        .await
        .map_err(|e| ctx.api_failure(Route::Clients, e))?;

    ctx.success(&format!("Client removed: {}", id));
    Ok(())
}
