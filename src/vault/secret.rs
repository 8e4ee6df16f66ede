//! Secret and SecretStatus types stored inside a vault.
//!
//! Each secret holds its name, the opaque value bytes and the time it was
//! last saved.  The `value` field uses custom serde helpers so it
//! serializes as a base64 string in the plaintext JSON rather than a raw
//! byte array.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Re-use the base64 serde helpers from format.rs (no duplication).
use super::format::{base64_decode, base64_encode};

/// Secret names the control panel reports on in `status`, unless the
/// configuration overrides the list.
pub const DEFAULT_KNOWN_SECRETS: &[&str] = &["jira", "portal", "hydra", "supportshell", "github"];

/// A single secret stored in the vault.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// The name of the secret (e.g. "jira").
    pub name: String,

    /// The opaque secret value.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub value: Vec<u8>,

    /// When this secret was last saved.
    pub saved_at: DateTime<Utc>,
}

impl Secret {
    /// Create a secret stamped with the current time.
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            saved_at: Utc::now(),
        }
    }

    /// The value as text, replacing invalid UTF-8 sequences.
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }

    /// Status view of this secret (no value).
    pub fn status(&self) -> SecretStatus {
        SecretStatus {
            exists: true,
            saved_at: Some(self.saved_at),
        }
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Existence flag and timestamp for a known secret name.
///
/// Returned by `CredentialVault::status` so callers can show which
/// tokens are configured without ever touching a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretStatus {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SecretStatus {
    pub fn missing() -> Self {
        Self {
            exists: false,
            saved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_serializes_as_base64() {
        let secret = Secret::new("jira", b"abc".to_vec());
        let json = serde_json::to_value(&secret).unwrap();
        assert_eq!(json["value"], "YWJj");
        assert!(json.get("savedAt").is_some());
    }

    #[test]
    fn debug_never_prints_value() {
        let secret = Secret::new("portal", b"super-secret".to_vec());
        let printed = format!("{secret:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("portal"));
    }

    #[test]
    fn missing_status_omits_timestamp() {
        let json = serde_json::to_value(SecretStatus::missing()).unwrap();
        assert_eq!(json, serde_json::json!({ "exists": false }));
    }
}
