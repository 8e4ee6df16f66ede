//! High-level vault operations used by the router and CLI commands.
//!
//! `CredentialVault` wraps the file format layer and the crypto layer so
//! that the rest of the application can work with simple method calls
//! like `vault.set_secret("jira", b"token")`.
//!
//! Every mutation re-reads the file, merges the change, re-encrypts the
//! whole map with a fresh IV and rewrites the file, all while holding an
//! in-process lock. Reads need no lock because writes land via rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::{open, seal, KeyDeriver, VaultKey};
use crate::errors::{Result, ToolVaultError};

use super::format::{self, VAULT_FILE_NAME};
use super::secret::{Secret, SecretStatus, DEFAULT_KNOWN_SECRETS};

/// Maximum accepted length of a secret name.
const MAX_NAME_LEN: usize = 256;

/// The encrypted, host-bound secret store.
///
/// Construct one per process and share it (e.g. behind an `Arc`); the
/// internal lock only serializes writers of this instance.
pub struct CredentialVault {
    /// Path to the vault file on disk.
    path: PathBuf,

    /// Key pair derived from the host identity (zeroized on drop).
    key: VaultKey,

    /// Names reported by `status`.
    known_secrets: Vec<String>,

    /// Held across read-merge-encrypt-write.
    write_lock: Mutex<()>,
}

impl CredentialVault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open the vault stored in `vault_dir`, keyed by `deriver`.
    ///
    /// No file I/O happens here; a missing vault file simply reads as
    /// empty until the first save creates it.
    pub fn open(vault_dir: &Path, deriver: &KeyDeriver) -> Result<Self> {
        let key = deriver.derive()?;
        Ok(Self {
            path: vault_dir.join(VAULT_FILE_NAME),
            key,
            known_secrets: DEFAULT_KNOWN_SECRETS.iter().map(|s| s.to_string()).collect(),
            write_lock: Mutex::new(()),
        })
    }

    /// Replace the list of names reported by `status`.
    pub fn with_known_secrets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_secrets = names.into_iter().map(Into::into).collect();
        self
    }

    // ------------------------------------------------------------------
    // Whole-map operations
    // ------------------------------------------------------------------

    /// Decrypt and return every stored secret.
    ///
    /// A missing file is an empty map. A file that exists but cannot be
    /// authenticated, decrypted or parsed is `CorruptVault`, never an
    /// empty map: it usually means tampering or a changed host identity.
    pub fn load(&self) -> Result<BTreeMap<String, Secret>> {
        let Some(raw) = format::read_vault_file(&self.path)? else {
            debug!(path = %self.path.display(), "no vault file, starting empty");
            return Ok(BTreeMap::new());
        };

        let text = std::str::from_utf8(&raw).map_err(|_| self.corrupt("file is not text"))?;
        let (iv, body) = format::decode_envelope(text).map_err(|reason| self.corrupt(reason))?;

        let plaintext = Zeroizing::new(
            open(&self.key, &iv, &body)
                .map_err(|_| self.corrupt("authentication or decryption failed"))?,
        );

        let secrets: BTreeMap<String, Secret> = serde_json::from_slice(&plaintext)
            .map_err(|e| self.corrupt(format!("decrypted payload is not a secret map: {e}")))?;

        if let Some((key, secret)) = secrets.iter().find(|(key, s)| **key != s.name) {
            return Err(self.corrupt(format!(
                "entry '{key}' holds a secret named '{}'",
                secret.name
            )));
        }

        debug!(path = %self.path.display(), secrets = secrets.len(), "vault loaded");
        Ok(secrets)
    }

    /// Encrypt and persist the whole map, replacing the previous file.
    pub fn save(&self, secrets: &BTreeMap<String, Secret>) -> Result<()> {
        let _guard = self.lock();
        self.write_locked(secrets)
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Add or replace a secret and persist the vault.
    pub fn set_secret(&self, name: &str, value: &[u8]) -> Result<Secret> {
        validate_secret_name(name)?;

        let _guard = self.lock();
        let mut secrets = self.load()?;
        let secret = Secret::new(name, value.to_vec());
        secrets.insert(name.to_string(), secret.clone());
        self.write_locked(&secrets)?;

        info!(name = name, "secret saved");
        Ok(secret)
    }

    /// Look up a single secret.
    pub fn get_secret(&self, name: &str) -> Result<Option<Secret>> {
        validate_secret_name(name)?;
        Ok(self.load()?.remove(name))
    }

    /// Remove a secret. Returns `false` if it was not stored.
    pub fn delete_secret(&self, name: &str) -> Result<bool> {
        validate_secret_name(name)?;

        let _guard = self.lock();
        let mut secrets = self.load()?;
        if secrets.remove(name).is_none() {
            return Ok(false);
        }
        self.write_locked(&secrets)?;

        info!(name = name, "secret deleted");
        Ok(true)
    }

    /// Existence and timestamp for each known secret name.
    pub fn status(&self) -> Result<BTreeMap<String, SecretStatus>> {
        let secrets = self.load()?;
        Ok(self
            .known_secrets
            .iter()
            .map(|name| {
                let status = secrets
                    .get(name)
                    .map_or_else(SecretStatus::missing, Secret::status);
                (name.clone(), status)
            })
            .collect())
    }

    /// Delete the vault file. Safe to call when nothing is stored.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.lock();
        if format::remove_vault_file(&self.path)? {
            info!(path = %self.path.display(), "vault reset");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a vault file is present on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize, seal and write. The caller must hold `write_lock`.
    ///
    /// Nothing touches the disk until the ciphertext is complete, so a
    /// failure here leaves the previous file untouched.
    fn write_locked(&self, secrets: &BTreeMap<String, Secret>) -> Result<()> {
        // Anything `load` would reject must never reach the disk.
        for (key, secret) in secrets {
            validate_secret_name(key)?;
            if *key != secret.name {
                return Err(ToolVaultError::InvalidSecretName(format!(
                    "entry '{key}' holds a secret named '{}'",
                    secret.name
                )));
            }
        }

        let plaintext = Zeroizing::new(serde_json::to_vec(secrets).map_err(|e| {
            ToolVaultError::EncryptionFailed(format!("serializing secrets: {e}"))
        })?);

        let sealed = seal(&self.key, &plaintext)?;
        format::write_vault_file(&self.path, &format::encode_envelope(&sealed))?;

        debug!(path = %self.path.display(), secrets = secrets.len(), "vault written");
        Ok(())
    }

    fn corrupt(&self, reason: impl Into<String>) -> ToolVaultError {
        let reason = reason.into();
        warn!(path = %self.path.display(), reason = %reason, "vault file rejected");
        ToolVaultError::CorruptVault {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Validate that a secret name is safe.
///
/// Allowed: ASCII letters, digits, underscores, hyphens, periods.
/// Must be non-empty and at most 256 characters.
pub fn validate_secret_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ToolVaultError::InvalidSecretName(
            "secret name cannot be empty".into(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ToolVaultError::InvalidSecretName(format!(
            "secret name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(ToolVaultError::InvalidSecretName(format!(
            "'{name}' contains invalid characters — only ASCII letters, digits, underscores, hyphens, and periods are allowed"
        )));
    }
    Ok(())
}
