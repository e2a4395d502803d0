//! JSONL file sink and subscriber composition.
//!
//! Multi-process safe via append-only, flush-per-line writes.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Central log file location: `~/.bizdesk/logs/bizdesk.jsonl`.
///
/// Returns `None` when the home directory cannot be determined.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".bizdesk").join("logs").join("bizdesk.jsonl"))
}

/// File writer that appends to the central log file.
#[derive(Clone)]
pub struct CentralLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl CentralLogWriter {
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl io::Write for CentralLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let result = guard.write(buf);
        // Each line must hit the file before the next process appends.
        guard.flush()?;
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber
#[derive(Clone)]
pub struct WriterFactory {
    writer: CentralLogWriter,
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = CentralLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber: JSONL file layer plus optional stderr.
///
/// If the log file cannot be opened, logging falls back to stderr so a
/// read-only home directory never prevents the binary from running.
pub(crate) fn init_subscriber(config: &LogConfig) {
    let log_path = config.log_path.clone().or_else(default_log_path);

    let (json_layer, open_error) = match log_path.as_deref().map(CentralLogWriter::new) {
        Some(Ok(writer)) => (
            Some(JsonLayer::new(
                config.service_name.clone(),
                WriterFactory { writer },
            )),
            None,
        ),
        Some(Err(e)) => (None, Some(e.to_string())),
        None => (None, Some("home directory not found".to_string())),
    };

    let stderr_enabled = config.also_stderr || json_layer.is_none();
    let stderr_layer = if stderr_enabled {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(true)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer.map(|l| l.with_filter(env_filter(&config.default_level))))
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    match (log_path, open_error) {
        (Some(path), None) => {
            tracing::debug!(log_path = %path.display(), "observability initialized")
        }
        (_, Some(error)) => {
            tracing::warn!(error = %error, "log file unavailable, logging to stderr only")
        }
        (None, None) => {}
    }
}
