//! AES-256-CBC encryption with an HMAC-SHA256 tag (encrypt-then-MAC).
//!
//! Each call to `seal` generates a fresh random 16-byte IV, so sealing the
//! same plaintext twice never yields the same output.
//!
//! Layout of the sealed body (the IV travels separately):
//!   [ CBC ciphertext (PKCS#7 padded) | 32-byte HMAC-SHA256(iv || ciphertext) ]
//!
//! The tag is checked in constant time before any decryption is attempted,
//! so a truncated or bit-flipped body always fails with `DecryptionFailed`.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::keys::VaultKey;
use crate::errors::{Result, ToolVaultError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Size of the CBC initialization vector in bytes (128 bits).
pub const IV_LEN: usize = 16;

/// Size of the HMAC-SHA256 tag appended to the ciphertext.
pub const TAG_LEN: usize = 32;

const BLOCK_LEN: usize = 16;

/// Output of `seal`: the IV and the ciphertext-plus-tag body.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub iv: [u8; IV_LEN],
    pub body: Vec<u8>,
}

/// Encrypt and authenticate `plaintext` under `key`.
pub fn seal(key: &VaultKey, plaintext: &[u8]) -> Result<Sealed> {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(key.encryption_key(), &iv)
        .map_err(|e| ToolVaultError::EncryptionFailed(format!("invalid key or IV length: {e}")))?;
    let mut body = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let tag = compute_tag(key, &iv, &body)
        .map_err(|e| ToolVaultError::EncryptionFailed(format!("tag computation: {e}")))?;
    body.extend_from_slice(&tag);

    Ok(Sealed { iv, body })
}

/// Verify and decrypt a body produced by `seal`.
pub fn open(key: &VaultKey, iv: &[u8], body: &[u8]) -> Result<Vec<u8>> {
    if iv.len() != IV_LEN || body.len() < BLOCK_LEN + TAG_LEN {
        return Err(ToolVaultError::DecryptionFailed);
    }

    let (ciphertext, tag) = body.split_at(body.len() - TAG_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(ToolVaultError::DecryptionFailed);
    }

    let mut mac = HmacSha256::new_from_slice(key.authentication_key())
        .map_err(|_| ToolVaultError::DecryptionFailed)?;
    mac.update(iv);
    mac.update(ciphertext);
    mac.verify_slice(tag)
        .map_err(|_| ToolVaultError::DecryptionFailed)?;

    let cipher = Aes256CbcDec::new_from_slices(key.encryption_key(), iv)
        .map_err(|_| ToolVaultError::DecryptionFailed)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ToolVaultError::DecryptionFailed)
}

fn compute_tag(key: &VaultKey, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key.authentication_key())
        .map_err(|e| ToolVaultError::EncryptionFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KEY_LEN;

    fn key(seed: u8) -> VaultKey {
        VaultKey::from_parts([seed; KEY_LEN], [seed.wrapping_add(1); KEY_LEN])
    }

    #[test]
    fn body_is_block_aligned_plus_tag() {
        let sealed = seal(&key(3), b"0123456789").unwrap();
        assert_eq!(sealed.body.len(), BLOCK_LEN + TAG_LEN);

        // A full block of plaintext gains a whole block of padding.
        let sealed = seal(&key(3), &[7u8; BLOCK_LEN]).unwrap();
        assert_eq!(sealed.body.len(), 2 * BLOCK_LEN + TAG_LEN);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let k = key(9);
        let sealed = seal(&k, b"").unwrap();
        assert_eq!(open(&k, &sealed.iv, &sealed.body).unwrap(), b"");
    }

    #[test]
    fn flipped_iv_is_rejected() {
        let k = key(5);
        let mut sealed = seal(&k, b"{\"a\":1}").unwrap();
        sealed.iv[0] ^= 0x01;
        assert!(open(&k, &sealed.iv, &sealed.body).is_err());
    }

    #[test]
    fn wrong_iv_length_is_rejected() {
        let k = key(5);
        let sealed = seal(&k, b"data").unwrap();
        assert!(open(&k, &sealed.iv[..8], &sealed.body).is_err());
    }
}
