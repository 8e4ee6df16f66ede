//! Cryptographic primitives for toolvault.
//!
//! This module provides:
//! - Host-identity key derivation (`identity`)
//! - HKDF-SHA256 sub-key expansion and the zeroizing `VaultKey` (`keys`)
//! - AES-256-CBC + HMAC-SHA256 sealing and opening (`encryption`)

pub mod encryption;
pub mod identity;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, KeyDeriver, ...};
pub use encryption::{open, seal, Sealed, IV_LEN, TAG_LEN};
pub use identity::{HostIdentity, KeyDeriver};
pub use keys::{derive_subkey, VaultKey, KEY_LEN};
