//! Request and response shapes.
//!
//! Client, task and finance records are passed through as
//! [`serde_json::Value`]; only the advice chat has a fixed shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who said a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => f.write_str("you"),
            ChatRole::Assistant => f.write_str("advisor"),
        }
    }
}

/// One line of an advice conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AdviceRequest<'a> {
    pub message: &'a str,
    pub history: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdviceResponse {
    #[serde(alias = "response", alias = "answer")]
    pub reply: String,
}

/// Pull a record list out of either `[...]` or `{"<key>": [...]}`.
pub(crate) fn unwrap_list(value: serde_json::Value, key: &str) -> Option<Vec<serde_json::Value>> {
    match value {
        serde_json::Value::Array(items) => Some(items),
        serde_json::Value::Object(mut map) => match map.remove(key) {
            Some(serde_json::Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}
