//! Task commands.

use super::{record_from, record_id, update_from, AppContext};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use bizdesk_auth::Route;
use chrono::NaiveDate;
use serde_json::{json, Value};

/// Fields accepted by `tasks add` and `tasks update`.
#[derive(Debug, Default, clap::Args)]
pub struct TaskFields {
    /// Short description of the task
    #[arg(long)]
    pub title: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Client the task is for
    #[arg(long)]
    pub client_id: Option<String>,
    /// Mark done (true) or open (false)
    #[arg(long)]
    pub done: Option<bool>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

impl TaskFields {
    fn into_fields(self) -> Result<Vec<(&'static str, Option<Value>)>> {
        let due = self.due.as_deref().map(parse_due).transpose()?;
        Ok(vec![
            ("title", self.title.map(|v| json!(v))),
            ("due_date", due.map(|v| json!(v))),
            ("client_id", self.client_id.map(|v| json!(v))),
            ("done", self.done.map(|v| json!(v))),
            ("notes", self.notes.map(|v| json!(v))),
        ])
    }
}

/// Validate a due date and normalize it to ISO format.
fn parse_due(raw: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid due date '{}', expected YYYY-MM-DD", raw))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// List tasks, optionally only the open ones.
pub async fn tasks_list(ctx: &AppContext, open_only: bool) -> Result<()> {
    ctx.enter(Route::Tasks)?;

    let mut tasks = ctx
        .api
        .list_tasks()
        .await
        .map_err(|e| ctx.api_failure(Route::Tasks, e))?;
    if open_only {
        tasks.retain(super::dashboard::is_open);
    }

    match ctx.format {
        OutputFormat::Text => output::print_table(
            &tasks,
            &[
                ("ID", "id", 8),
                ("Title", "title", 36),
                ("Due", "due_date", 12),
                ("Done", "done", 5),
            ],
            "No tasks found",
        ),
        OutputFormat::Json => output::print_json(&tasks),
    }
    Ok(())
}

/// Add a task. `title` is required.
pub async fn tasks_add(ctx: &AppContext, fields: TaskFields) -> Result<()> {
    ctx.enter(Route::Tasks)?;

    if fields.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        anyhow::bail!("A task needs a title (--title)");
    }
    let record = record_from(fields.into_fields()?);

    let created = ctx
        .api
        .create_task(&record)
        .await
        .map_err(|e| ctx.api_failure(Route::Tasks, e))?;

    match ctx.format {
        OutputFormat::Text => ctx.success(&format!("Task added: {}", record_id(&created))),
        OutputFormat::Json => output::print_json(&created),
    }
    Ok(())
}

/// Update the given fields of a task.
pub async fn tasks_update(ctx: &AppContext, id: &str, fields: TaskFields) -> Result<()> {
    ctx.enter(Route::Tasks)?;

    let record = update_from(fields.into_fields()?)?;
    let updated = ctx
        .api
        .update_task(id, &record)
        .await
        .map_err(|e| ctx.api_failure(Route::Tasks, e))?;

    match ctx.format {
        OutputFormat::Text => ctx.success(&format!("Task updated: {}", id)),
        OutputFormat::Json => output::print_json(&updated),
    }
    Ok(())
}

/// Remove a task.
pub async fn tasks_remove(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.enter(Route::Tasks)?;

    ctx.api
        .delete_task(id)
        .await
        .map_err(|e| ctx.api_failure(Route::Tasks, e))?;

    ctx.success(&format!("Task removed: {}", id));
    Ok(())
}
