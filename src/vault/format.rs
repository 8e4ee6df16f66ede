//! Vault file envelope and atomic, owner-only file I/O.
//!
//! A vault file is a single line of text:
//!
//! ```text
//! <ivHex>:<cipherHex>
//! ```
//!
//! - **ivHex**: the 16-byte CBC initialization vector, lowercase hex.
//! - **cipherHex**: the CBC ciphertext followed by its 32-byte HMAC tag,
//!   lowercase hex (see `crypto::encryption`).
//!
//! The whole secret map is sealed as one blob; there is no per-entry
//! patching.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::Deserialize;

use crate::crypto::{Sealed, IV_LEN, TAG_LEN};
use crate::errors::Result;

/// File name of the vault inside the vault directory.
pub const VAULT_FILE_NAME: &str = "secrets.vault";

/// Separator between the IV and the ciphertext fields.
const SEPARATOR: char = ':';

/// Render a sealed blob as `ivHex:cipherHex`.
pub fn encode_envelope(sealed: &Sealed) -> String {
    format!(
        "{}{SEPARATOR}{}",
        hex::encode(sealed.iv),
        hex::encode(&sealed.body)
    )
}

/// Split `ivHex:cipherHex` back into raw IV and body bytes.
///
/// Returns a human-readable reason on failure; the caller decides how to
/// surface it.
pub fn decode_envelope(text: &str) -> std::result::Result<(Vec<u8>, Vec<u8>), String> {
    let (iv_hex, body_hex) = text
        .trim()
        .split_once(SEPARATOR)
        .ok_or_else(|| "missing ':' separator".to_string())?;

    let iv = hex::decode(iv_hex).map_err(|e| format!("IV is not valid hex: {e}"))?;
    if iv.len() != IV_LEN {
        return Err(format!("IV must be {IV_LEN} bytes, got {}", iv.len()));
    }

    let body = hex::decode(body_hex).map_err(|e| format!("ciphertext is not valid hex: {e}"))?;
    if body.len() <= TAG_LEN {
        return Err("ciphertext is too short".into());
    }

    Ok((iv, body))
}

/// Read the raw vault file, or `None` if it does not exist.
pub fn read_vault_file(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write the vault file **atomically** with owner-only permissions.
///
/// 1. Create the parent directory (0700 on Unix) if needed.
/// 2. Write to a temp file in the same directory, created 0600.
/// 3. Flush to disk and rename over the target path.
///
/// Readers see either the old file or the new one, never a mix.
pub fn write_vault_file(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    create_private_dir(parent)?;

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let written = write_private(&tmp_path, contents.as_bytes()).and_then(|()| {
        fs::rename(&tmp_path, path)?;
        Ok(())
    });

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

/// Delete the vault file. Returns `false` if it was already absent.
pub fn remove_vault_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    if dir.exists() {
        #[cfg(unix)]
        restrict_existing_dir(dir);
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)?;
    }

    #[cfg(not(unix))]
    fs::create_dir_all(dir)?;

    Ok(())
}

/// Narrow a pre-existing vault directory to owner-only. Failing to do so
/// (e.g. the directory belongs to someone else) is logged, not fatal.
#[cfg(unix)]
fn restrict_existing_dir(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(meta) = fs::metadata(dir) else {
        return;
    };
    let mode = meta.permissions().mode() & 0o777;
    if mode & 0o077 == 0 {
        return;
    }
    match fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
        Ok(()) => tracing::warn!(
            dir = %dir.display(),
            old_mode = %format!("{mode:o}"),
            "vault directory was accessible to other users; restricted to 0700"
        ),
        Err(e) => tracing::warn!(
            dir = %dir.display(),
            mode = %format!("{mode:o}"),
            error = %e,
            "vault directory is accessible to other users and could not be restricted"
        ),
    }
}

fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // A stale temp file from a crashed run keeps its old mode; tighten it.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
