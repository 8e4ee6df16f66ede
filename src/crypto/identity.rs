//! Host-bound key derivation.
//!
//! The vault key is a pure function of the machine's hostname, the current
//! user name and a fixed application salt. Nothing is persisted: the same
//! user on the same machine always re-derives the same key, while a copy of
//! the vault file on another machine (or under another account) cannot be
//! decrypted.
//!
//! Trust boundary: this keeps secrets away from other unprivileged local
//! users and from casual inspection of the file. Code running as the same
//! user can re-derive the key, so it offers no protection against that.

use zeroize::Zeroize;

use super::keys::VaultKey;
use crate::errors::Result;

/// Fixed application salt mixed into every derivation.
const APP_SALT: &[u8] = b"toolvault-host-bound-vault-v1";

/// The stable identity a vault key is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    hostname: String,
    username: String,
}

impl HostIdentity {
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
        }
    }

    /// Read the identity of the running process.
    ///
    /// Never fails: missing values fall back to fixed placeholders.
    pub fn current() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.trim().is_empty())
            .or_else(|| non_empty_var("HOSTNAME"))
            .or_else(|| non_empty_var("COMPUTERNAME"))
            .unwrap_or_else(|| "unknown-host".into());

        let username = non_empty_var("USER")
            .or_else(|| non_empty_var("USERNAME"))
            .unwrap_or_else(|| "unknown-user".into());

        Self::new(hostname.trim(), username.trim())
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Length-prefixed `hostname || username`, so that ("ab", "c") and
    /// ("a", "bc") never produce the same material.
    fn key_material(&self) -> Vec<u8> {
        let mut material = Vec::with_capacity(16 + self.hostname.len() + self.username.len());
        for part in [&self.hostname, &self.username] {
            material.extend_from_slice(&(part.len() as u64).to_le_bytes());
            material.extend_from_slice(part.as_bytes());
        }
        material
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Derives the vault key for one host identity.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    identity: HostIdentity,
}

impl KeyDeriver {
    pub fn new(identity: HostIdentity) -> Self {
        Self { identity }
    }

    /// Deriver bound to the running user on this machine.
    pub fn for_current_host() -> Self {
        Self::new(HostIdentity::current())
    }

    /// Derive the 256-bit vault key pair.
    ///
    /// Deterministic for a given identity. The only error HKDF can report is
    /// an oversized output, which cannot happen for 32-byte keys.
    pub fn derive(&self) -> Result<VaultKey> {
        let mut material = self.identity.key_material();
        let key = VaultKey::from_material(&material, APP_SALT);
        material.zeroize();
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = KeyDeriver::new(HostIdentity::new("box", "alice")).derive().unwrap();
        let b = KeyDeriver::new(HostIdentity::new("box", "alice")).derive().unwrap();
        assert_eq!(a.encryption_key(), b.encryption_key());
        assert_eq!(a.authentication_key(), b.authentication_key());
    }

    #[test]
    fn different_user_different_key() {
        let a = KeyDeriver::new(HostIdentity::new("box", "alice")).derive().unwrap();
        let b = KeyDeriver::new(HostIdentity::new("box", "bob")).derive().unwrap();
        assert_ne!(a.encryption_key(), b.encryption_key());
    }

    #[test]
    fn different_host_different_key() {
        let a = KeyDeriver::new(HostIdentity::new("box-1", "alice")).derive().unwrap();
        let b = KeyDeriver::new(HostIdentity::new("box-2", "alice")).derive().unwrap();
        assert_ne!(a.encryption_key(), b.encryption_key());
    }

    #[test]
    fn boundary_shift_does_not_collide() {
        let a = KeyDeriver::new(HostIdentity::new("ab", "c")).derive().unwrap();
        let b = KeyDeriver::new(HostIdentity::new("a", "bc")).derive().unwrap();
        assert_ne!(a.encryption_key(), b.encryption_key());
    }

    #[test]
    fn current_identity_is_never_empty() {
        let id = HostIdentity::current();
        assert!(!id.hostname().is_empty());
        assert!(!id.username().is_empty());
    }
}
