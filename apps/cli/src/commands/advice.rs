//! AI business advice.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use bizdesk_api::ChatMessage;
use bizdesk_auth::Route;
use serde_json::json;
use std::io::{self, BufRead, Write};
use tracing::debug;

fn is_exit(line: &str) -> bool {
    matches!(line, "" | "exit" | "quit" | "/exit" | "/quit")
}

/// Ask one question, appending both sides of the exchange to `history`.
async fn turn(ctx: &AppContext, message: &str, history: &mut Vec<ChatMessage>) -> Result<String> {
    let reply = ctx
        .api
        .ask_advice(message, history)
        .await
        .map_err(|e| ctx.api_failure(Route::Advice, e))?;

    history.push(ChatMessage::user(message));
    history.push(ChatMessage::assistant(reply.clone()));
    debug!(turns = history.len() / 2, "Advice turn complete");
    Ok(reply)
}

/// One question, or an interactive conversation with `chat`.
pub async fn advice(ctx: &AppContext, message: Option<String>, chat: bool) -> Result<()> {
    ctx.enter(Route::Advice)?;

    let mut history = Vec::new();

    if !chat {
        let Some(message) = message.filter(|m| !m.trim().is_empty()) else {
            anyhow::bail!("Ask a question, or use --chat for a conversation");
        };
        let reply = turn(ctx, message.trim(), &mut history).await?;
        match ctx.format {
            OutputFormat::Text => println!("{}", reply),
            OutputFormat::Json => output::print_json(&json!({ "reply": reply })),
        }
        return Ok(());
    }

    if ctx.format == OutputFormat::Text {
        println!("Business advisor. Empty line or 'exit' to finish.");
    }

    let mut pending = message.filter(|m| !m.trim().is_empty());
    let stdin = io::stdin();
    loop {
        let line = match pending.take() {
            Some(first) => first,
            None => {
                print!("you> ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                line
            }
        };

        let line = line.trim();
        if is_exit(line) {
            break;
        }

        let reply = turn(ctx, line, &mut history).await?;
        match ctx.format {
            OutputFormat::Text => println!("\n{}\n", reply),
            OutputFormat::Json => println!("{}", json!({ "reply": reply })),
        }
    }

    if ctx.format == OutputFormat::Json {
        output::print_json(&json!({ "history": history }));
    }
    Ok(())
}
