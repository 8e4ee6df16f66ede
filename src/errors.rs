use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in toolvault.
#[derive(Debug, Error)]
pub enum ToolVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — data was not produced by this host's vault key")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Vault at {path} is corrupt or was written on another machine: {reason}")]
    CorruptVault { path: PathBuf, reason: String },

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Invalid secret name: {0}")]
    InvalidSecretName(String),

    // --- Router errors ---
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Invalid parameters for '{operation}': {reason}")]
    InvalidParams { operation: String, reason: String },

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

/// Convenience type alias for toolvault results.
pub type Result<T> = std::result::Result<T, ToolVaultError>;
