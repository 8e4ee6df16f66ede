//! `toolvault dispatch` — run one operation and print its result JSON.

use std::sync::Arc;

use serde_json::Value;

use crate::cli::{load_settings, open_vault, Cli};
use crate::errors::{Result, ToolVaultError};
use crate::router::RequestRouter;
use crate::translate::OperationResult;

/// Execute the `dispatch` command.
///
/// The result JSON always goes to stdout. A `Failure` result also makes
/// the command fail so the exit status is 1.
pub async fn execute(cli: &Cli, operation: &str, params: Option<&str>, pretty: bool) -> Result<()> {
    let params = match params.map(serde_json::from_str::<Value>) {
        None => Value::Object(Default::default()),
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            let result = OperationResult::from(ToolVaultError::InvalidParams {
                operation: operation.to_string(),
                reason: format!("--params is not valid JSON: {e}"),
            });
            return emit(&result, pretty);
        }
    };

    let settings = load_settings(cli)?;
    let vault = Arc::new(open_vault(cli, &settings)?);
    let router = RequestRouter::new(&settings, vault)?;

    let result = router.dispatch(operation, params).await;
    emit(&result, pretty)
}

fn emit(result: &OperationResult, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
    .map_err(|e| ToolVaultError::SerializationError(e.to_string()))?;
    println!("{text}");

    match result.as_failure() {
        Some(failure) => Err(ToolVaultError::OperationFailed(failure.to_string())),
        None => Ok(()),
    }
}
