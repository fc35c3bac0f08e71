//! # taskloom-vault
//!
//! Credential lookup for the Taskloom platform.
//!
//! A [`CredentialStore`] is an explicit name → secret mapping, built from
//! the environment or a TOML file and threaded through constructors — there
//! is no process-wide singleton. Secret values never appear in `Debug` or
//! `Display` output; callers must go through [`Secret::expose`].
//!
//! Real secret backends (cloud secret managers, OS keychains) sit behind
//! this interface as external collaborators.

pub mod credentials;
pub mod error;

// ── re-exports ───────────────────────────────────────────────────────

pub use credentials::{CredentialStore, Secret};
pub use error::{Result, VaultError};
