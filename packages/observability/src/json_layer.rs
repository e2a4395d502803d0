//! JSONL event layer.
//!
//! Each event becomes one line: timestamp, level, service, pid, target,
//! message, the enclosing span name and the event fields. Fields go through
//! [`redact`] while they are recorded, so a credential is never formatted
//! into the line buffer in the first place.

use crate::redact;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// One line of the log file.
#[derive(Debug, Serialize)]
pub struct LogEntry<'a> {
    pub timestamp: String,
    pub level: &'a str,
    pub service: &'a str,
    pub pid: u32,
    pub target: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<&'a str>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

/// Collects the message and fields of one event, redacting as it goes.
#[derive(Default)]
struct RedactingVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl RedactingVisitor {
    fn text(&mut self, field: &Field, raw: &str) {
        if field.name() == "message" {
            self.message = Some(raw.to_string());
            return;
        }
        self.fields
            .insert(field.name().to_string(), redact::redact_field(field.name(), raw));
    }

    fn scalar(&mut self, field: &Field, value: Value) {
        let value = if redact::is_sensitive_key(field.name()) {
            Value::String(redact::REDACTED.to_string())
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for RedactingVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() != "message" && redact::is_sensitive_key(field.name()) {
            self.scalar(field, Value::Null);
            return;
        }
        self.text(field, &format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.text(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.text(field, &value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.scalar(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.scalar(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.scalar(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.scalar(field, value);
    }
}

/// Layer writing one JSON object per event to `make_writer`.
pub struct JsonLayer<W> {
    service: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service: String, make_writer: W) -> Self {
        Self {
            service,
            pid: std::process::id(),
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = RedactingVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: metadata.level().as_str(),
            service: &self.service,
            pid: self.pid,
            target: metadata.target(),
            message: visitor.message.unwrap_or_default(),
            span: ctx.event_span(event).map(|span| span.name()),
            fields: visitor.fields,
        };

        let Ok(mut line) = serde_json::to_vec(&entry) else {
            return;
        };
        line.push(b'\n');
        // Single write so concurrent events never interleave within a line.
        let mut writer = self.make_writer.make_writer();
        let _ = writer.write_all(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(emit: impl FnOnce()) -> Vec<Value> {
        let buffer = BufferWriter::default();
        let subscriber = tracing_subscriber::registry()
            .with(JsonLayer::new("cli".to_string(), buffer.clone()));
        tracing::subscriber::with_default(subscriber, emit);

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn login_event_hides_credentials() {
        let lines = capture(|| {
            tracing::info!(
                email = "owner@shop.test",
                token = "tok-abc",
                header = "Bearer tok-abc",
                "Login successful"
            );
        });

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["message"], "Login successful");
        assert_eq!(line["service"], "cli");
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["email"], "owner@shop.test");
        assert_eq!(line["fields"]["token"], redact::REDACTED);
        assert_eq!(line["fields"]["header"], redact::REDACTED);
        assert!(line.get("span").is_none());
    }

    #[test]
    fn sensitive_debug_and_numeric_fields_are_redacted() {
        let password = String::from("hunter2");
        let lines = capture(|| {
            tracing::warn!(password = ?password, credential_len = 7u64, status = 401u64, "rejected");
        });

        let fields = &lines[0]["fields"];
        assert_eq!(fields["password"], redact::REDACTED);
        assert_eq!(fields["credential_len"], redact::REDACTED);
        assert_eq!(fields["status"], 401);
    }

    #[test]
    fn span_name_and_empty_fields() {
        let lines = capture(|| {
            let span = tracing::info_span!("revalidate");
            let _guard = span.enter();
            tracing::debug!("Session verified with server");
        });

        assert_eq!(lines[0]["span"], "revalidate");
        assert_eq!(lines[0]["level"], "DEBUG");
        assert!(lines[0].get("fields").is_none());
    }
}
