//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::crypto::KeyDeriver;
use crate::errors::Result;
use crate::vault::CredentialVault;

/// toolvault CLI: encrypted credential vault and tool orchestration.
#[derive(Parser)]
#[command(
    name = "toolvault",
    about = "Encrypted local credential vault and external tool orchestration",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/toolvault/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Vault directory (overrides the config file)
    #[arg(long, env = "TOOLVAULT_VAULT_DIR", global = true)]
    pub vault_dir: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run an operation and print its JSON result
    Dispatch {
        /// Operation name (e.g. "check report" or check-report)
        operation: String,

        /// Parameters as a JSON object (e.g. '{"customer":"acme"}')
        #[arg(short, long)]
        params: Option<String>,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// List the available operations
    Operations,

    /// Show which known secrets are stored
    Status,

    /// Save a secret (add or replace)
    Save {
        /// Secret name (e.g. jira)
        name: String,
        /// Secret value (omit for interactive prompt)
        value: Option<String>,
    },

    /// Delete a secret
    Delete {
        /// Secret name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete the whole vault file
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from `--config`, else the default location.
///
/// A missing file means defaults.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    match cli.config.clone().or_else(Settings::default_path) {
        Some(path) => Settings::load(&path),
        None => Ok(Settings::default()),
    }
}

/// Open the vault for this host, honoring `--vault-dir` and the config.
pub fn open_vault(cli: &Cli, settings: &Settings) -> Result<CredentialVault> {
    let dir = settings.resolve_vault_dir(cli.vault_dir.as_deref())?;
    let vault = CredentialVault::open(&dir, &KeyDeriver::for_current_host())?;
    Ok(vault.with_known_secrets(settings.known_secrets.iter().cloned()))
}

/// Default log filter for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
