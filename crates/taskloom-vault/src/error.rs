//! Vault error types.

use thiserror::Error;

/// Convenience alias used throughout the vault crate.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for credential operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No credential is stored under the requested name.
    #[error("credential not found: {name}")]
    NotFound { name: String },

    /// Reading a credential file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A credential file could not be parsed.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A credential file entry has a non-string value.
    #[error("invalid credential entry `{key}`: expected a string value")]
    InvalidEntry { key: String },
}
