//! The caller-facing result contract.
//!
//! Serialized for the UI layer as
//!
//! ```text
//! {"status":"success","payload":{...}}
//! {"status":"failure","kind":"ToolError","message":"...","rawOutput":"..."}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ToolVaultError;

/// Why an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    UnknownOperation,
    InvalidParams,
    LaunchFailed,
    Timeout,
    ToolError,
    MalformedOutput,
    PatternNotFound,
    CorruptVault,
    EncryptionFailed,
    SecretNotFound,
    StorageFailed,
}

impl FailureKind {
    /// Kinds that may mean stored data is damaged or was not written.
    /// The UI should surface these prominently.
    pub fn is_data_affecting(self) -> bool {
        matches!(self, Self::CorruptVault | Self::EncryptionFailed)
    }

    /// Operational failures the caller may retry. Nothing retries
    /// automatically.
    pub fn is_retryable(self) -> bool {
        !self.is_data_affecting()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownOperation => "UnknownOperation",
            Self::InvalidParams => "InvalidParams",
            Self::LaunchFailed => "LaunchFailed",
            Self::Timeout => "Timeout",
            Self::ToolError => "ToolError",
            Self::MalformedOutput => "MalformedOutput",
            Self::PatternNotFound => "PatternNotFound",
            Self::CorruptVault => "CorruptVault",
            Self::EncryptionFailed => "EncryptionFailed",
            Self::SecretNotFound => "SecretNotFound",
            Self::StorageFailed => "StorageFailed",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a failed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    /// Tool stdout+stderr, kept whenever the tool produced any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw_output: None,
        }
    }

    pub fn with_raw_output(mut self, raw_output: Option<String>) -> Self {
        self.raw_output = raw_output;
        self
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<ToolVaultError> for Failure {
    fn from(err: ToolVaultError) -> Self {
        let kind = match &err {
            ToolVaultError::CorruptVault { .. } | ToolVaultError::DecryptionFailed => {
                FailureKind::CorruptVault
            }
            ToolVaultError::EncryptionFailed(_) | ToolVaultError::KeyDerivationFailed(_) => {
                FailureKind::EncryptionFailed
            }
            ToolVaultError::SecretNotFound(_) => FailureKind::SecretNotFound,
            ToolVaultError::InvalidSecretName(_) | ToolVaultError::InvalidParams { .. } => {
                FailureKind::InvalidParams
            }
            ToolVaultError::UnknownOperation(_) => FailureKind::UnknownOperation,
            ToolVaultError::OperationFailed(_) | ToolVaultError::CommandFailed(_) => {
                FailureKind::ToolError
            }
            ToolVaultError::ConfigError(_)
            | ToolVaultError::Io(_)
            | ToolVaultError::SerializationError(_)
            | ToolVaultError::TaskFailed(_) => FailureKind::StorageFailed,
        };
        Failure::new(kind, err.to_string())
    }
}

/// What every dispatch returns: a payload or a typed failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
    Success { payload: Value },
    Failure(Failure),
}

impl OperationResult {
    pub fn success(payload: Value) -> Self {
        Self::Success { payload }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(Failure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload } => Some(payload),
            Self::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.as_failure().map(|f| f.kind)
    }
}

impl From<Failure> for OperationResult {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl From<ToolVaultError> for OperationResult {
    fn from(err: ToolVaultError) -> Self {
        Self::Failure(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_wire_shape() {
        let result = OperationResult::success(json!({ "count": 2 }));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "status": "success", "payload": { "count": 2 } })
        );
    }

    #[test]
    fn failure_wire_shape() {
        let result: OperationResult = Failure::new(FailureKind::ToolError, "rate limited")
            .with_raw_output(Some("rate limited\n".into()))
            .into();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "status": "failure",
                "kind": "ToolError",
                "message": "rate limited",
                "rawOutput": "rate limited\n"
            })
        );
    }

    #[test]
    fn failure_without_raw_output_omits_field() {
        let value =
            serde_json::to_value(OperationResult::failure(FailureKind::Timeout, "slow")).unwrap();
        assert!(value.get("rawOutput").is_none());
    }

    #[test]
    fn parses_back_from_wire() {
        let text = r#"{"status":"failure","kind":"CorruptVault","message":"bad"}"#;
        let result: OperationResult = serde_json::from_str(text).unwrap();
        assert_eq!(result.kind(), Some(FailureKind::CorruptVault));
    }

    #[test]
    fn only_vault_damage_is_data_affecting() {
        assert!(FailureKind::CorruptVault.is_data_affecting());
        assert!(FailureKind::EncryptionFailed.is_data_affecting());
        assert!(FailureKind::Timeout.is_retryable());
        assert!(FailureKind::ToolError.is_retryable());
        assert!(!FailureKind::CorruptVault.is_retryable());
    }

    #[test]
    fn errors_map_to_kinds() {
        let corrupt = ToolVaultError::CorruptVault {
            path: "/tmp/v".into(),
            reason: "bad tag".into(),
        };
        assert_eq!(Failure::from(corrupt).kind, FailureKind::CorruptVault);

        let bad_name = ToolVaultError::InvalidSecretName("x y".into());
        assert_eq!(Failure::from(bad_name).kind, FailureKind::InvalidParams);

        let io = ToolVaultError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(Failure::from(io).kind, FailureKind::StorageFailed);
    }
}
