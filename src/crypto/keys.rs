//! Vault key material and HKDF-SHA256 sub-key expansion.
//!
//! A single input keying material (derived from host identity, see
//! `identity`) is expanded into two independent sub-keys:
//! - an **encryption** key for AES-256-CBC
//! - an **authentication** key for the HMAC-SHA256 tag over the ciphertext
//!
//! HKDF (RFC 5869) binds each sub-key to its own `info` context string.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Result, ToolVaultError};

/// Length of every derived key (256 bits).
pub const KEY_LEN: usize = 32;

const ENCRYPTION_INFO: &[u8] = b"toolvault-vault-encryption";
const AUTHENTICATION_INFO: &[u8] = b"toolvault-vault-authentication";

/// Run HKDF-SHA256 extract + expand for a single 32-byte output.
pub fn derive_subkey(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| ToolVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// The pair of keys protecting the vault file.
///
/// Both halves are wiped from memory when the key is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    encryption: [u8; KEY_LEN],
    authentication: [u8; KEY_LEN],
}

impl VaultKey {
    /// Expand both sub-keys from `ikm` under `salt`.
    pub fn from_material(ikm: &[u8], salt: &[u8]) -> Result<Self> {
        let mut encryption = derive_subkey(ikm, salt, ENCRYPTION_INFO)?;
        let mut authentication = derive_subkey(ikm, salt, AUTHENTICATION_INFO)?;

        let key = Self::from_parts(encryption, authentication);
        encryption.zeroize();
        authentication.zeroize();
        Ok(key)
    }

    /// Build a key from raw sub-keys.
    pub fn from_parts(encryption: [u8; KEY_LEN], authentication: [u8; KEY_LEN]) -> Self {
        Self {
            encryption,
            authentication,
        }
    }

    pub fn encryption_key(&self) -> &[u8; KEY_LEN] {
        &self.encryption
    }

    pub fn authentication_key(&self) -> &[u8; KEY_LEN] {
        &self.authentication
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_keys_are_independent() {
        let key = VaultKey::from_material(b"material", b"salt").unwrap();
        assert_ne!(key.encryption_key(), key.authentication_key());
    }

    #[test]
    fn same_inputs_same_keys() {
        let a = VaultKey::from_material(b"material", b"salt").unwrap();
        let b = VaultKey::from_material(b"material", b"salt").unwrap();
        assert_eq!(a.encryption_key(), b.encryption_key());
        assert_eq!(a.authentication_key(), b.authentication_key());
    }

    #[test]
    fn salt_changes_keys() {
        let a = derive_subkey(b"material", b"salt-a", b"info").unwrap();
        let b = derive_subkey(b"material", b"salt-b", b"info").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = VaultKey::from_parts([1u8; KEY_LEN], [2u8; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "VaultKey(<redacted>)");
    }
}
