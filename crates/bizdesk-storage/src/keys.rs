//! Storage key constants.

/// Keys written by the session store.
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer credential (raw string)
    pub const TOKEN: &'static str = "token";

    /// Signed-in identity (JSON)
    pub const USER: &'static str = "user";
}
