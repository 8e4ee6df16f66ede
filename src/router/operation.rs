//! The closed set of operations the UI layer can dispatch.

use std::fmt;
use std::str::FromStr;

use crate::errors::ToolVaultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    SearchKnowledgeBase,
    CheckReport,
    UpdateReport,
    PostReport,
    OnboardDiscover,
    OnboardGenerate,
    RunCli,
    CheckAuth,
    SaveSecret,
    LoadSecret,
    DeleteSecret,
    SecretStatus,
    ResetVault,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::SearchKnowledgeBase,
        Operation::CheckReport,
        Operation::UpdateReport,
        Operation::PostReport,
        Operation::OnboardDiscover,
        Operation::OnboardGenerate,
        Operation::RunCli,
        Operation::CheckAuth,
        Operation::SaveSecret,
        Operation::LoadSecret,
        Operation::DeleteSecret,
        Operation::SecretStatus,
        Operation::ResetVault,
    ];

    /// Canonical name, as accepted by `dispatch`.
    pub fn name(self) -> &'static str {
        match self {
            Operation::SearchKnowledgeBase => "search knowledge base",
            Operation::CheckReport => "check report",
            Operation::UpdateReport => "update report",
            Operation::PostReport => "post report",
            Operation::OnboardDiscover => "onboard discover",
            Operation::OnboardGenerate => "onboard generate",
            Operation::RunCli => "run cli",
            Operation::CheckAuth => "check auth",
            Operation::SaveSecret => "save secret",
            Operation::LoadSecret => "load secret",
            Operation::DeleteSecret => "delete secret",
            Operation::SecretStatus => "secret status",
            Operation::ResetVault => "reset vault",
        }
    }

    /// One-line summary including the parameters it takes.
    pub fn description(self) -> &'static str {
        match self {
            Operation::SearchKnowledgeBase => {
                "Search the knowledge base {query, product?, limit?}"
            }
            Operation::CheckReport => "List report issues for a customer {customer}",
            Operation::UpdateReport => "Refresh a customer's report {customer}",
            Operation::PostReport => "Publish a customer's report {customer, format?}",
            Operation::OnboardDiscover => "Discover account details for a customer {name}",
            Operation::OnboardGenerate => "Generate onboarding configuration {}",
            Operation::RunCli => "Run a taminator CLI command {command, args?}",
            Operation::CheckAuth => "Probe VPN, Kerberos and stored tokens {}",
            Operation::SaveSecret => "Store a secret in the vault {name, value}",
            Operation::LoadSecret => "Read a secret from the vault {name}",
            Operation::DeleteSecret => "Remove a secret from the vault {name}",
            Operation::SecretStatus => "Show which known secrets are stored {}",
            Operation::ResetVault => "Delete the vault file {}",
        }
    }

    /// `true` for operations that run an external tool.
    pub fn is_tool_backed(self) -> bool {
        matches!(
            self,
            Operation::SearchKnowledgeBase
                | Operation::CheckReport
                | Operation::UpdateReport
                | Operation::PostReport
                | Operation::OnboardDiscover
                | Operation::OnboardGenerate
                | Operation::RunCli
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ToolVaultError;

    /// Case-insensitive; `-` and `_` count as spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .to_ascii_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if normalized == "check report status" {
            return Ok(Operation::CheckReport);
        }

        Operation::ALL
            .into_iter()
            .find(|op| op.name() == normalized)
            .ok_or_else(|| ToolVaultError::UnknownOperation(s.to_string()))
    }
}
