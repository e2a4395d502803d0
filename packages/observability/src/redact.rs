//! Credential redaction for structured log fields.
//!
//! Applied by the JSON layer to every event field as it is recorded.

use serde_json::Value;

pub const REDACTED: &str = "[REDACTED]";

const MAX_FIELD_LEN: usize = 512;

const DENYLIST_KEYS: [&str; 8] = [
    "token",
    "authorization",
    "cookie",
    "password",
    "secret",
    "credential",
    "api_key",
    "apikey",
];

/// Value to log for a field named `key` whose recorded text is `raw`.
pub fn redact_field(key: &str, raw: &str) -> Value {
    if is_sensitive_key(key) || looks_like_sensitive_value(raw) {
        return Value::String(REDACTED.to_string());
    }
    if raw.len() > MAX_FIELD_LEN {
        return Value::String(format!("[TRUNCATED:len={}]", raw.len()));
    }
    Value::String(raw.to_string())
}

/// Bearer headers, JWT-shaped strings and long opaque blobs.
pub fn looks_like_sensitive_value(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("bearer ") {
        return true;
    }
    if raw.matches('.').count() == 2 && raw.len() > 40 && !raw.contains(' ') {
        return true;
    }
    is_long_hex(raw) || is_long_base64(raw)
}

pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

fn is_long_hex(value: &str) -> bool {
    value.len() > 48 && value.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_long_base64(value: &str) -> bool {
    value.len() > 48
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=' || c == '_')
}
