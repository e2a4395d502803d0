//! Authentication commands.

use super::{AppContext, Redirect};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use bizdesk_auth::{AuthError, Navigation, Route, RouteGuard, SessionView};
use serde_json::json;
use std::io::{self, Write};

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

/// Login with email and password.
///
/// Already signed in: reports the current user unless `force` is set, in
/// which case a failed attempt keeps the existing session.
pub async fn login(ctx: &AppContext, email: Option<String>, force: bool) -> Result<()> {
    if let Navigation::Redirect { .. } = RouteGuard::resolve(Route::Login, &*ctx.session) {
        if !force {
            let who = ctx
                .session
                .current_identity()
                .map(|identity| identity.email)
                .unwrap_or_else(|| "unknown".to_string());
            ctx.success(&format!("Already logged in as {}", who));
            return Ok(());
        }
    }

    let email = match email {
        Some(email) => email.trim().to_string(),
        None => prompt_email()?,
    };
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }

    // Read password without echo
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    if ctx.format == OutputFormat::Text {
        println!("Logging in...");
    }

    match ctx.session.login(&email, &password).await {
        Ok(identity) => {
            let display = if identity.name.is_empty() {
                identity.email.clone()
            } else {
                format!("{} <{}>", identity.name, identity.email)
            };
            ctx.success(&format!("Logged in as {}", display));
            Ok(())
        }
        Err(AuthError::InvalidCredentials(_)) => {
            anyhow::bail!("Login failed: invalid email or password")
        }
        Err(e) => anyhow::bail!("Login failed: {}", e),
    }
}

/// Logout and clear session.
pub async fn logout(ctx: &AppContext) -> Result<()> {
    let was_signed_in = ctx.session.is_authenticated();
    ctx.session.logout()?;

    if was_signed_in {
        ctx.success("Logged out successfully");
    } else {
        ctx.success("Not logged in");
    }
    Ok(())
}

/// Outcome of `status --verify`.
#[derive(Debug, Clone, PartialEq)]
enum Verification {
    Skipped,
    Verified,
    Revoked,
    Unreachable(String),
}

impl Verification {
    /// Text line, if verification was requested.
    fn label(&self) -> Option<String> {
        match self {
            Verification::Skipped => None,
            Verification::Verified => Some("yes".to_string()),
            Verification::Revoked => Some("no, session was revoked and cleared".to_string()),
            Verification::Unreachable(reason) => Some(format!("unknown, {}", reason)),
        }
    }

    /// `verified` field of the JSON output; unknown is `null`.
    fn as_json(&self) -> Option<bool> {
        match self {
            Verification::Verified => Some(true),
            Verification::Revoked => Some(false),
            Verification::Skipped | Verification::Unreachable(_) => None,
        }
    }
}

/// Show session status. With `verify`, ask the server first.
///
/// Exits non-zero when the session was revoked or could not be checked.
pub async fn status(ctx: &AppContext, verify: bool) -> Result<()> {
    let verification = if verify && ctx.session.is_authenticated() {
        match ctx.session.revalidate().await {
            Ok(_) => Verification::Verified,
            Err(e) if e.is_unauthorized() => Verification::Revoked,
            Err(e) => Verification::Unreachable(e.to_string()),
        }
    } else {
        Verification::Skipped
    };

    let snapshot = ctx.session.snapshot();
    let logged_in = snapshot.is_authenticated();

    match ctx.format {
        OutputFormat::Text => {
            println!("Server:   {}", ctx.config.api_url);
            if let Some(identity) = &snapshot.identity {
                println!("Auth:     logged in");
                println!("Email:    {}", identity.email);
                if !identity.name.is_empty() {
                    println!("Name:     {}", identity.name);
                }
            } else {
                println!("Auth:     not logged in");
            }
            if let Some(label) = verification.label() {
                println!("Verified: {}", label);
            }
        }
        OutputFormat::Json => {
            let mut body = json!({
                "api_url": ctx.config.api_url,
                "state": snapshot.state,
                "logged_in": logged_in,
                "email": snapshot.identity.as_ref().map(|i| &i.email),
                "name": snapshot.identity.as_ref().map(|i| &i.name),
                "verified": verification.as_json(),
            });
            if let Verification::Unreachable(reason) = &verification {
                body["verify_error"] = json!(reason);
            }
            output::print_json(&body);
        }
    }

    match verification {
        Verification::Revoked => Err(Redirect {
            to: Route::Login,
            from: Route::Dashboard,
        }
        .into()),
        Verification::Unreachable(reason) => {
            Err(anyhow::anyhow!("Could not verify session: {}", reason))
        }
        Verification::Skipped | Verification::Verified => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_server_is_reported_as_unknown() {
        let outcome = Verification::Unreachable("HTTP error: connection refused".to_string());
        assert_eq!(
            outcome.label().as_deref(),
            Some("unknown, HTTP error: connection refused")
        );
        assert_eq!(outcome.as_json(), None);
    }

    #[test]
    fn verification_outcomes() {
        assert_eq!(Verification::Skipped.label(), None);
        assert_eq!(Verification::Verified.label().as_deref(), Some("yes"));
        assert_eq!(Verification::Verified.as_json(), Some(true));
        assert_eq!(Verification::Revoked.as_json(), Some(false));
    }
}
