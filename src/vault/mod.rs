//! Vault module — encrypted, host-bound secret storage.
//!
//! This module provides:
//! - `Secret` and `SecretStatus` types (`secret`)
//! - The `ivHex:cipherHex` file envelope and atomic private writes (`format`)
//! - High-level `CredentialVault` for loading and mutating secrets (`store`)

pub mod format;
pub mod secret;
pub mod store;

// Re-export the most commonly used items.
pub use format::VAULT_FILE_NAME;
pub use secret::{Secret, SecretStatus, DEFAULT_KNOWN_SECRETS};
pub use store::{validate_secret_name, CredentialVault};
