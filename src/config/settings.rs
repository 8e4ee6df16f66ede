use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ToolVaultError};
use crate::executor::MAX_TIMEOUT;
use crate::router::Operation;
use crate::vault::DEFAULT_KNOWN_SECRETS;

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "toolvault";

/// User-level configuration, loaded from `<config_dir>/toolvault/config.toml`.
///
/// Every field has a sensible default so toolvault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `secrets.vault`. Defaults to the platform local
    /// data directory + `toolvault`.
    #[serde(default)]
    pub vault_dir: Option<PathBuf>,

    /// Timeout for operations that do not set their own (default: 30 s).
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Secret names reported by `secret status`.
    #[serde(default = "default_known_secrets")]
    pub known_secrets: Vec<String>,

    /// Per-operation overrides, keyed by operation name
    /// (e.g. `[operations."check report"]`).
    #[serde(default)]
    pub operations: BTreeMap<String, OperationOverride>,
}

/// Replaces parts of a tool-backed operation's default invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationOverride {
    /// Program to run instead of the default tool.
    #[serde(default)]
    pub tool: Option<String>,

    /// Arguments placed before the operation's own arguments. Replaces the
    /// default prefix entirely when set.
    #[serde(default)]
    pub args_prefix: Option<Vec<String>>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Static variables added to the tool's environment. Vault secrets
    /// injected for the operation take precedence.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_known_secrets() -> Vec<String> {
    DEFAULT_KNOWN_SECRETS.iter().map(|s| s.to_string()).collect()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: None,
            default_timeout_ms: default_timeout_ms(),
            known_secrets: default_known_secrets(),
            operations: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the config directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Default config location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(Self::FILE_NAME))
    }

    /// Load settings from `config_path`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed or fails validation, an
    /// error is returned.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            ToolVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check ranges and operation names.
    pub fn validate(&self) -> Result<()> {
        check_timeout("default_timeout_ms", self.default_timeout_ms)?;

        if self.known_secrets.iter().any(|name| name.trim().is_empty()) {
            return Err(ToolVaultError::ConfigError(
                "known_secrets cannot contain empty names".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for (name, over) in &self.operations {
            let op: Operation = name.parse().map_err(|_| {
                ToolVaultError::ConfigError(format!("unknown operation '{name}' in [operations]"))
            })?;
            if !seen.insert(op) {
                return Err(ToolVaultError::ConfigError(format!(
                    "operation '{op}' is configured more than once in [operations]"
                )));
            }
            if !op.is_tool_backed() {
                return Err(ToolVaultError::ConfigError(format!(
                    "operation '{op}' does not run a tool and cannot be overridden"
                )));
            }
            if over.tool.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err(ToolVaultError::ConfigError(format!(
                    "operation '{op}': tool cannot be empty"
                )));
            }
            if let Some(ms) = over.timeout_ms {
                check_timeout(&format!("operations.\"{op}\".timeout_ms"), ms)?;
            }
        }
        Ok(())
    }

    /// The override configured for `op`, matching names the same way
    /// `Operation::from_str` does.
    pub fn override_for(&self, op: Operation) -> Option<&OperationOverride> {
        self.operations
            .iter()
            .find(|(name, _)| name.parse::<Operation>().ok() == Some(op))
            .map(|(_, over)| over)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Where the vault lives: `cli_override`, then `vault_dir`, then the
    /// platform local data directory.
    pub fn resolve_vault_dir(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = cli_override {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = &self.vault_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| {
                ToolVaultError::ConfigError(
                    "no local data directory on this platform; set vault_dir or --vault-dir".into(),
                )
            })
    }
}

fn check_timeout(field: &str, ms: u64) -> Result<()> {
    let max = MAX_TIMEOUT.as_millis() as u64;
    if ms == 0 || ms > max {
        return Err(ToolVaultError::ConfigError(format!(
            "{field} must be between 1 and {max}, got {ms}"
        )));
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────
