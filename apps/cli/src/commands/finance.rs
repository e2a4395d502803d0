//! Finance summary.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use bizdesk_auth::Route;

/// Show the finance summary.
pub async fn finance(ctx: &AppContext) -> Result<()> {
    ctx.enter(Route::Finance)?;

    let summary = ctx
        .api
        .finance_summary()
        .await
        .map_err(|e| ctx.api_failure(Route::Finance, e))?;

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading("Finance summary");
            output::print_record(&summary);
        }
        OutputFormat::Json => output::print_json(&summary),
    }
    Ok(())
}
