//! Per-operation tool configuration.
//!
//! Built once from the defaults below plus the `[operations]` overrides in
//! `Settings`, then never mutated.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{OperationOverride, Settings};
use crate::errors::Result;
use crate::translate::{Capture, ExpectedShape, FieldRule, TextRule};

use super::operation::Operation;

pub const KNOWLEDGE_BASE_TOOL: &str = "tam-kb";
pub const REPORT_TOOL: &str = "tam-rfe";
pub const CLI_TOOL: &str = "python3";

/// A vault secret exported to a tool as an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretBinding {
    pub secret: &'static str,
    pub env_var: &'static str,
}

pub const JIRA_TOKEN: SecretBinding = SecretBinding {
    secret: "jira",
    env_var: "JIRA_TOKEN",
};

pub const PORTAL_TOKEN: SecretBinding = SecretBinding {
    secret: "portal",
    env_var: "PORTAL_TOKEN",
};

/// How one tool-backed operation is invoked and read.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub tool: String,
    /// Placed before the operation's own arguments.
    pub args_prefix: Vec<String>,
    /// `None` uses the executor's default.
    pub timeout: Option<Duration>,
    /// Static environment; injected secrets win over these.
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub secrets: Vec<SecretBinding>,
    pub shape: ExpectedShape,
}

impl ToolSpec {
    fn new(tool: &str, shape: ExpectedShape) -> Self {
        Self {
            tool: tool.to_string(),
            args_prefix: Vec::new(),
            timeout: None,
            env: BTreeMap::new(),
            working_dir: None,
            secrets: Vec::new(),
            shape,
        }
    }

    fn with_secrets(mut self, secrets: &[SecretBinding]) -> Self {
        self.secrets = secrets.to_vec();
        self
    }

    fn with_prefix(mut self, prefix: &[&str]) -> Self {
        self.args_prefix = prefix.iter().map(|s| s.to_string()).collect();
        self
    }

    fn apply(&mut self, over: &OperationOverride) {
        if let Some(tool) = &over.tool {
            self.tool = tool.clone();
        }
        if let Some(prefix) = &over.args_prefix {
            self.args_prefix = prefix.clone();
        }
        if let Some(ms) = over.timeout_ms {
            self.timeout = Some(Duration::from_millis(ms));
        }
        if let Some(dir) = &over.working_dir {
            self.working_dir = Some(dir.clone());
        }
        self.env.extend(over.env.clone());
    }
}

/// Default spec for a tool-backed operation; `None` for the rest.
pub fn default_spec(op: Operation) -> Result<Option<ToolSpec>> {
    let spec = match op {
        Operation::SearchKnowledgeBase => {
            ToolSpec::new(KNOWLEDGE_BASE_TOOL, ExpectedShape::Json).with_secrets(&[PORTAL_TOKEN])
        }
        Operation::CheckReport => ToolSpec::new(REPORT_TOOL, report_issues_shape()?)
            .with_secrets(&[JIRA_TOKEN, PORTAL_TOKEN]),
        Operation::UpdateReport => ToolSpec::new(REPORT_TOOL, ExpectedShape::PlainText)
            .with_secrets(&[JIRA_TOKEN, PORTAL_TOKEN]),
        Operation::PostReport => ToolSpec::new(REPORT_TOOL, posted_url_shape()?)
            .with_secrets(&[JIRA_TOKEN, PORTAL_TOKEN]),
        Operation::OnboardDiscover => {
            ToolSpec::new(REPORT_TOOL, discovery_shape()?).with_secrets(&[PORTAL_TOKEN])
        }
        Operation::OnboardGenerate => ToolSpec::new(REPORT_TOOL, generated_config_shape()?),
        Operation::RunCli => ToolSpec::new(CLI_TOOL, ExpectedShape::PlainText)
            .with_prefix(&["-m", "taminator"])
            .with_secrets(&[JIRA_TOKEN, PORTAL_TOKEN]),
        Operation::CheckAuth
        | Operation::SaveSecret
        | Operation::LoadSecret
        | Operation::DeleteSecret
        | Operation::SecretStatus
        | Operation::ResetVault => return Ok(None),
    };
    Ok(Some(spec))
}

/// `ABC-123 | summary` or `ABC-123: summary` lines.
fn report_issues_shape() -> Result<ExpectedShape> {
    Ok(ExpectedShape::TextPattern(TextRule::new().field(
        FieldRule::new(
            "issues",
            r"(?P<id>[A-Z]+-\d+)\s*[|:]\s*(?P<summary>.+)",
            Capture::All,
        )?
        .required(),
    )))
}

fn posted_url_shape() -> Result<ExpectedShape> {
    Ok(ExpectedShape::TextPattern(
        TextRule::new().field(FieldRule::new("url", r"https?://[^\s]+", Capture::Whole)?),
    ))
}

fn discovery_shape() -> Result<ExpectedShape> {
    Ok(ExpectedShape::TextPattern(
        TextRule::new()
            .field(FieldRule::new("account", r"(?i)Account[:\s]+(\d+)", Capture::First)?.required())
            .field(FieldRule::new("sbr", r"(?i)SBR[:\s]+([^\n]+)", Capture::List)?),
    ))
}

fn generated_config_shape() -> Result<ExpectedShape> {
    Ok(ExpectedShape::TextPattern(TextRule::new().field(
        FieldRule::new("configPath", r"(?i)Config[:\s]+([^\n]+)", Capture::First)?,
    )))
}

/// The immutable operation table.
#[derive(Debug, Clone)]
pub struct OperationTable {
    specs: BTreeMap<Operation, ToolSpec>,
}

impl OperationTable {
    pub fn build(settings: &Settings) -> Result<Self> {
        let mut specs = BTreeMap::new();
        for op in Operation::ALL {
            if let Some(mut spec) = default_spec(op)? {
                if let Some(over) = settings.override_for(op) {
                    spec.apply(over);
                }
                specs.insert(op, spec);
            }
        }
        Ok(Self { specs })
    }

    pub fn spec(&self, op: Operation) -> Option<&ToolSpec> {
        self.specs.get(&op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_backed_operation_has_a_spec() {
        let table = OperationTable::build(&Settings::default()).unwrap();
        for op in Operation::ALL {
            assert_eq!(table.spec(op).is_some(), op.is_tool_backed(), "{op}");
        }
    }

    #[test]
    fn defaults_match_the_tools() {
        let table = OperationTable::build(&Settings::default()).unwrap();
        let search = table.spec(Operation::SearchKnowledgeBase).unwrap();
        assert_eq!(search.tool, "tam-kb");
        assert_eq!(search.secrets, vec![PORTAL_TOKEN]);
        assert!(matches!(search.shape, ExpectedShape::Json));

        let cli = table.spec(Operation::RunCli).unwrap();
        assert_eq!(cli.tool, "python3");
        assert_eq!(cli.args_prefix, vec!["-m", "taminator"]);

        assert!(table
            .spec(Operation::OnboardGenerate)
            .unwrap()
            .secrets
            .is_empty());
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut settings = Settings::default();
        settings.operations.insert(
            "post-report".into(),
            OperationOverride {
                tool: Some("sh".into()),
                args_prefix: Some(vec!["/tmp/fake.sh".into()]),
                timeout_ms: Some(2_000),
                env: BTreeMap::from([("MODE".to_string(), "test".to_string())]),
                working_dir: None,
            },
        );
        let table = OperationTable::build(&settings).unwrap();
        let post = table.spec(Operation::PostReport).unwrap();
        assert_eq!(post.tool, "sh");
        assert_eq!(post.args_prefix, vec!["/tmp/fake.sh"]);
        assert_eq!(post.timeout, Some(Duration::from_secs(2)));
        assert_eq!(post.env["MODE"], "test");
        // Secret bindings are not configurable.
        assert_eq!(post.secrets, vec![JIRA_TOKEN, PORTAL_TOKEN]);
    }
}
