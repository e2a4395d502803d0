//! Dashboard: a one-screen overview.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use bizdesk_auth::Route;
use serde_json::{json, Value};

pub(crate) fn is_open(task: &Value) -> bool {
    match task.get("done").or_else(|| task.get("completed")) {
        Some(Value::Bool(done)) => !done,
        _ => task
            .get("status")
            .and_then(Value::as_str)
            .map(|s| !matches!(s, "done" | "completed"))
            .unwrap_or(true),
    }
}

/// Show counts and the finance balance for the signed-in user.
pub async fn dashboard(ctx: &AppContext) -> Result<()> {
    ctx.enter(Route::Dashboard)?;

    let (clients, tasks, summary) = tokio::join!(
        ctx.api.list_clients(),
        ctx.api.list_tasks(),
        ctx.api.finance_summary()
    );
    let clients = clients.map_err(|e| ctx.api_failure(Route::Dashboard, e))?;
    let tasks = tasks.map_err(|e| ctx.api_failure(Route::Dashboard, e))?;
    let summary = summary.map_err(|e| ctx.api_failure(Route::Dashboard, e))?;

    let open_tasks = tasks.iter().filter(|t| is_open(t)).count();
    let name = ctx
        .session
        .current_identity()
        .map(|i| if i.name.is_empty() { i.email } else { i.name })
        .unwrap_or_default();

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading(&format!("Welcome back, {}", name));
            output::print_row("Clients", &clients.len().to_string());
            output::print_row("Open tasks", &format!("{} of {}", open_tasks, tasks.len()));
            output::print_row("Balance", &output::cell(&summary, "balance"));
        }
        OutputFormat::Json => output::print_json(&json!({
            "user": name,
            "clients": clients.len(),
            "tasks": tasks.len(),
            "open_tasks": open_tasks,
            "finance": summary,
        })),
    }
    Ok(())
}
