//! Typed parameter objects for each operation.
//!
//! The UI sends a plain JSON object; each operation decodes it into one of
//! these structs. Values that end up as positional tool arguments must be
//! non-empty and must not look like flags.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{Result, ToolVaultError};

use super::operation::Operation;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerParams {
    pub customer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostParams {
    pub customer: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverParams {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CliParams {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveSecretParams {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretNameParams {
    pub name: String,
}

/// Decode `params` for `op`. `null` counts as an empty object.
pub fn decode<T: DeserializeOwned>(op: Operation, params: Value) -> Result<T> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| invalid(op, e.to_string()))
}

/// A value that will be passed as a positional argument.
pub fn positional(op: Operation, field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(op, format!("'{field}' cannot be empty")));
    }
    if value.starts_with('-') {
        return Err(invalid(op, format!("'{field}' cannot start with '-'")));
    }
    Ok(value.to_string())
}

/// A value that follows its own flag (`--product <value>`); only
/// emptiness is checked.
pub fn flag_value(op: Operation, field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(op, format!("'{field}' cannot be empty")));
    }
    Ok(value.to_string())
}

pub fn invalid(op: Operation, reason: impl Into<String>) -> ToolVaultError {
    ToolVaultError::InvalidParams {
        operation: op.name().to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_optional_fields() {
        let p: SearchParams = decode(
            Operation::SearchKnowledgeBase,
            json!({ "query": "kdump", "limit": 5 }),
        )
        .unwrap();
        assert_eq!(p.query, "kdump");
        assert_eq!(p.limit, Some(5));
        assert!(p.product.is_none());
    }

    #[test]
    fn missing_field_is_invalid_params() {
        let err = decode::<CustomerParams>(Operation::CheckReport, json!({})).unwrap_err();
        assert!(matches!(err, ToolVaultError::InvalidParams { .. }));
    }

    #[test]
    fn wrong_type_is_invalid_params() {
        let err =
            decode::<SearchParams>(Operation::SearchKnowledgeBase, json!({ "query": 7 }))
                .unwrap_err();
        assert!(matches!(err, ToolVaultError::InvalidParams { .. }));
    }

    #[test]
    fn null_params_decode_as_empty_object() {
        #[derive(Deserialize)]
        struct Empty {}
        assert!(decode::<Empty>(Operation::SecretStatus, Value::Null).is_ok());
    }

    #[test]
    fn positional_rejects_empty_and_flags() {
        assert!(positional(Operation::CheckReport, "customer", "  ").is_err());
        assert!(positional(Operation::CheckReport, "customer", "--all").is_err());
        assert_eq!(
            positional(Operation::CheckReport, "customer", " acme ").unwrap(),
            "acme"
        );
    }
}
