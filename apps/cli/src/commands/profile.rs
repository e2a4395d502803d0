//! Profile view.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use bizdesk_auth::{Identity, IdentityPatch, Route};
use serde_json::{Map, Value};

/// Parse `key=value` into a preference entry. The value is read as JSON when
/// it parses (numbers, booleans, objects), otherwise as a string. `key=`
/// yields `null`, which removes the preference.
fn parse_preference(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        anyhow::bail!("Preferences are key=value, got '{}'", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Preference key is empty in '{}'", raw);
    }

    let value = value.trim();
    let value = if value.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
    };
    Ok((key.to_string(), value))
}

fn print_identity(identity: &Identity, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            output::print_heading("Profile");
            output::print_row("Name", if identity.name.is_empty() { "-" } else { identity.name.as_str() });
            output::print_row("Email", &identity.email);
            for (key, value) in &identity.preferences {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                output::print_row(key, &shown);
            }
        }
        OutputFormat::Json => output::print_json(identity),
    }
}

/// Show the signed-in user's profile.
pub async fn profile_show(ctx: &AppContext) -> Result<()> {
    ctx.enter(Route::Profile)?;

    let identity = ctx
        .session
        .current_identity()
        .ok_or_else(|| anyhow::anyhow!("No profile loaded"))?;
    print_identity(&identity, &ctx.format);
    Ok(())
}

/// Send a profile patch, then merge it into the session.
pub async fn profile_update(
    ctx: &AppContext,
    name: Option<String>,
    email: Option<String>,
    preferences: Vec<String>,
) -> Result<()> {
    ctx.enter(Route::Profile)?;

    let mut prefs = Map::new();
    for raw in &preferences {
        let (key, value) = parse_preference(raw)?;
        prefs.insert(key, value);
    }
    let patch = IdentityPatch {
        name,
        email,
        preferences: prefs,
    };
    if patch.is_empty() {
        anyhow::bail!("Nothing to update: pass --name, --email or --pref");
    }

    let server_identity = ctx
        .api
        .update_profile(&patch)
        .await
        .map_err(|e| ctx.api_failure(Route::Profile, e))?;

    let merged = ctx.session.update_identity(&patch)?;
    tracing::debug!(email = %merged.email, "Profile merged into session");

    print_identity(&server_identity, &ctx.format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preference_values() {
        assert_eq!(
            parse_preference("theme=dark").unwrap(),
            ("theme".to_string(), json!("dark"))
        );
        assert_eq!(
            parse_preference("weekly_digest=true").unwrap(),
            ("weekly_digest".to_string(), json!(true))
        );
        assert_eq!(
            parse_preference("tax_rate = 0.21").unwrap(),
            ("tax_rate".to_string(), json!(0.21))
        );
        assert_eq!(
            parse_preference("currency=").unwrap(),
            ("currency".to_string(), Value::Null)
        );
    }

    #[test]
    fn malformed_preferences() {
        assert!(parse_preference("theme").is_err());
        assert!(parse_preference("=dark").is_err());
    }
}
