//! Typed access to the persisted session.

use crate::{PersistentStorage, StorageKeys, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// A token/user pair read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession<U> {
    pub token: String,
    pub user: U,
}

/// High-level API for persisting the session credential and identity.
pub struct SessionPersistence {
    storage: Box<dyn PersistentStorage>,
}

impl SessionPersistence {
    /// Create a new session persistence layer over the given backend.
    pub fn new(storage: Box<dyn PersistentStorage>) -> Self {
        Self { storage }
    }

    /// Persist token and user together, replacing any stored pair.
    ///
    /// The old token is removed before anything else is written, so every
    /// intermediate state reads as either the old pair or no session. If a
    /// write fails the previous pair is put back; if that fails too, both
    /// keys are cleared. A new user is never left next to an old token.
    pub fn save_session<U: Serialize>(&self, token: &str, user: &U) -> StorageResult<()> {
        let user_json = serde_json::to_string(user)?;
        let previous = self.raw_pair()?;

        self.storage.delete(StorageKeys::TOKEN)?;
        let written = self
            .storage
            .set(StorageKeys::USER, &user_json)
            .and_then(|()| self.storage.set(StorageKeys::TOKEN, token));

        if let Err(e) = written {
            warn!(error = %e, "Failed to write session, rolling back");
            self.roll_back(previous);
            return Err(e);
        }
        Ok(())
    }

    fn raw_pair(&self) -> StorageResult<Option<(String, String)>> {
        let token = self.get_token()?;
        let user = self.storage.get(StorageKeys::USER)?;
        Ok(token.zip(user))
    }

    fn roll_back(&self, previous: Option<(String, String)>) {
        if let Some((token, user)) = previous {
            let restored = self
                .storage
                .set(StorageKeys::USER, &user)
                .and_then(|()| self.storage.set(StorageKeys::TOKEN, &token));
            match restored {
                Ok(()) => {
                    debug!("Previous session restored");
                    return;
                }
                Err(e) => warn!(error = %e, "Failed to restore previous session"),
            }
        }

        if let Err(e) = self.clear_session() {
            warn!(error = %e, "Failed to clear partially written session");
        }
    }

    /// Read the persisted pair. Anything but a non-empty token plus a user
    /// reads as `None`. A user entry that fails to decode is an error.
    pub fn load_session<U: DeserializeOwned>(&self) -> StorageResult<Option<StoredSession<U>>> {
        let token = match self.get_token()? {
            Some(token) => token,
            None => return Ok(None),
        };

        let user = match self.get_user()? {
            Some(user) => user,
            None => return Ok(None),
        };

        Ok(Some(StoredSession { token, user }))
    }

    /// The persisted credential, if any. Empty strings read as absent.
    pub fn get_token(&self) -> StorageResult<Option<String>> {
        Ok(self
            .storage
            .get(StorageKeys::TOKEN)?
            .filter(|token| !token.is_empty()))
    }

    /// The persisted identity, if any.
    pub fn get_user<U: DeserializeOwned>(&self) -> StorageResult<Option<U>> {
        match self.storage.get(StorageKeys::USER)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Check whether a complete token/user pair is stored.
    pub fn has_session(&self) -> StorageResult<bool> {
        Ok(self.get_token()?.is_some() && self.storage.has(StorageKeys::USER)?)
    }

    /// Remove token and user. Safe to call when nothing is stored.
    pub fn clear_session(&self) -> StorageResult<()> {
        let token = self.storage.delete(StorageKeys::TOKEN);
        let user = self.storage.delete(StorageKeys::USER);
        token?;
        user?;
        Ok(())
    }
}
