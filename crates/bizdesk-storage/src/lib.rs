//! Persistent storage for the bizdesk session.
//!
//! This crate provides:
//! - [`PersistentStorage`], a synchronous string key/value trait
//! - [`FileStorage`], a JSON file backend with atomic replace-on-write
//! - [`MemoryStorage`], an in-process backend for tests and ephemeral runs
//! - [`SessionPersistence`], the typed token/user API on top of any backend

mod file;
mod keys;
mod memory;
mod session;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use session::{SessionPersistence, StoredSession};
pub use traits::PersistentStorage;

use bizdesk_config::Paths;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default file-backed storage at `~/.bizdesk/session.json`.
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn PersistentStorage>> {
    let storage = FileStorage::new(paths.session_file());
    Ok(Box::new(storage))
}

/// Create a [`SessionPersistence`] over the default file storage.
pub fn create_session_persistence(paths: &Paths) -> StorageResult<SessionPersistence> {
    let storage = create_storage(paths)?;
    Ok(SessionPersistence::new(storage))
}
