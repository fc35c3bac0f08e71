//! The credential store and masked secret wrapper.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, VaultError};

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A credential value that masks itself in all formatted output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value. Callers are responsible for keeping it out of logs.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("****")
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// An explicit name → secret mapping.
///
/// Built once at startup and passed to the components that need it; never
/// global.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    secrets: HashMap<String, Secret>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from environment variables starting with `prefix`.
    ///
    /// The prefix is stripped and the remainder lowercased, so with prefix
    /// `TASKLOOM_SECRET_` the variable `TASKLOOM_SECRET_MAIL_API_KEY`
    /// becomes the credential `mail_api_key`.
    pub fn from_env(prefix: &str) -> Self {
        let mut store = Self::new();
        for (key, value) in std::env::vars() {
            if let Some(name) = key.strip_prefix(prefix) {
                store.insert(name.to_lowercase(), value);
            }
        }
        info!(count = store.len(), prefix, "credentials loaded from environment");
        store
    }

    /// Build a store from a flat TOML table of string values.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let table: toml::Table = text.parse()?;

        let mut store = Self::new();
        for (key, value) in table {
            let toml::Value::String(value) = value else {
                return Err(VaultError::InvalidEntry { key });
            };
            store.insert(key, value);
        }

        info!(count = store.len(), path = %path.display(), "credentials loaded from file");
        Ok(store)
    }

    /// Insert or replace a credential.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        debug!(name = %name, "credential stored");
        self.secrets.insert(name, Secret::new(value));
    }

    /// Look up a credential by name.
    pub fn get(&self, name: &str) -> Result<&Secret> {
        self.secrets.get(name).ok_or_else(|| VaultError::NotFound {
            name: name.to_string(),
        })
    }

    /// The names of all stored credentials (values stay masked).
    pub fn names(&self) -> Vec<&str> {
        self.secrets.keys().map(String::as_str).collect()
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn insert_and_get() {
        let mut store = CredentialStore::new();
        store.insert("mail_api_key", "sk-12345");

        let secret = store.get("mail_api_key").unwrap();
        assert_eq!(secret.expose(), "sk-12345");
    }

    #[test]
    fn missing_credential_is_not_found() {
        let store = CredentialStore::new();
        let result = store.get("nope");
        assert!(matches!(result, Err(VaultError::NotFound { .. })));
    }

    #[test]
    fn secret_masks_debug_and_display() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(****)");
        assert_eq!(format!("{secret}"), "****");
        assert!(!format!("{:?}", CredentialStore::default()).contains("hunter2"));
    }

    #[test]
    fn from_toml_file_loads_flat_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mail_api_key = \"sk-abc\"").unwrap();
        writeln!(file, "chat_token = \"xoxb-def\"").unwrap();

        let store = CredentialStore::from_toml_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("chat_token").unwrap().expose(), "xoxb-def");
    }

    #[test]
    fn from_toml_file_rejects_non_string_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 587").unwrap();

        let result = CredentialStore::from_toml_file(file.path());
        assert!(matches!(result, Err(VaultError::InvalidEntry { .. })));
    }

    #[test]
    fn from_env_strips_prefix_and_lowercases() {
        // Process-global env; use a name unlikely to collide.
        std::env::set_var("TASKLOOM_VAULT_TEST_MAIL_KEY", "v1");
        let store = CredentialStore::from_env("TASKLOOM_VAULT_TEST_");
        std::env::remove_var("TASKLOOM_VAULT_TEST_MAIL_KEY");

        assert_eq!(store.get("mail_key").unwrap().expose(), "v1");
    }
}
