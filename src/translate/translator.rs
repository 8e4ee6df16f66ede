//! Turns a raw `ProcessOutcome` into an `OperationResult`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::executor::{ProcessOutcome, Termination};

use super::pattern::TextRule;
use super::result::{Failure, FailureKind, OperationResult};

/// What a tool is expected to print on stdout when it exits 0.
#[derive(Debug, Clone)]
pub enum ExpectedShape {
    /// A single JSON document.
    Json,
    /// Labeled text, scraped with a `TextRule`.
    TextPattern(TextRule),
    /// Free-form text returned verbatim as `{"output": ...}`.
    PlainText,
}

/// Translate `outcome` given the shape its operation expects.
///
/// Priority: launch failure, then timeout, then a non-zero or signal
/// exit, then shape parsing. Any failure after launch carries the tool's
/// combined output when there was some.
pub fn translate(outcome: &ProcessOutcome, shape: &ExpectedShape) -> OperationResult {
    let raw_output = outcome.combined_output();

    match &outcome.termination {
        Termination::LaunchFailed { reason } => {
            return OperationResult::failure(FailureKind::LaunchFailed, reason.clone());
        }
        Termination::TimedOut { after } => {
            return Failure::new(
                FailureKind::Timeout,
                format!("tool timed out after {} ms", after.as_millis()),
            )
            .with_raw_output(raw_output)
            .into();
        }
        Termination::Exited { code: Some(0) } => {}
        Termination::Exited { code } => {
            return Failure::new(FailureKind::ToolError, tool_error_message(outcome, *code))
                .with_raw_output(raw_output)
                .into();
        }
    }

    let stdout = outcome.stdout_text();
    match shape {
        ExpectedShape::Json => parse_json(&stdout, raw_output),
        ExpectedShape::TextPattern(rule) => match rule.extract(&stdout) {
            Ok(mut fields) => {
                fields.insert("output".into(), Value::String(stdout.trim().to_string()));
                OperationResult::success(Value::Object(fields))
            }
            Err(field) => {
                debug!(field = %field, "required field missing from tool output");
                Failure::new(
                    FailureKind::PatternNotFound,
                    format!("expected '{field}' in tool output"),
                )
                .with_raw_output(raw_output)
                .into()
            }
        },
        ExpectedShape::PlainText => {
            let mut payload = Map::new();
            payload.insert("output".into(), Value::String(stdout.trim().to_string()));
            OperationResult::success(Value::Object(payload))
        }
    }
}

fn parse_json(stdout: &str, raw_output: Option<String>) -> OperationResult {
    if stdout.trim().is_empty() {
        return Failure::new(FailureKind::MalformedOutput, "tool produced no output")
            .with_raw_output(raw_output)
            .into();
    }
    match serde_json::from_str::<Value>(stdout) {
        Ok(payload) => OperationResult::success(payload),
        Err(e) => Failure::new(
            FailureKind::MalformedOutput,
            format!("tool output is not valid JSON: {e}"),
        )
        .with_raw_output(raw_output)
        .into(),
    }
}

/// stderr if the tool wrote any, else stdout, else the exit status.
fn tool_error_message(outcome: &ProcessOutcome, code: Option<i32>) -> String {
    let stderr = outcome.stderr_text();
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = outcome.stdout_text();
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    match code {
        Some(code) => format!("tool exited with code {code}"),
        None => "tool was terminated by a signal".to_string(),
    }
}
