//! `toolvault save` — add or replace a secret in the vault.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_settings, open_vault, Cli};
use crate::errors::{Result, ToolVaultError};
use crate::vault::validate_secret_name;

/// Execute the `save` command.
pub fn execute(cli: &Cli, name: &str, value: Option<&str>) -> Result<()> {
    validate_secret_name(name)?;

    // Determine the secret value from one of three sources.
    let secret_value = Zeroizing::new(if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line — it may appear in shell history.");
        v.to_string()
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf.trim_end().to_string()
    } else {
        // Source 3: Interactive secure prompt (default).
        dialoguer::Password::new()
            .with_prompt(format!("Enter value for {name}"))
            .interact()
            .map_err(|e| ToolVaultError::CommandFailed(format!("input prompt: {e}")))?
    });

    if secret_value.is_empty() {
        return Err(ToolVaultError::CommandFailed(
            "secret value cannot be empty".into(),
        ));
    }

    let settings = load_settings(cli)?;
    let vault = open_vault(cli, &settings)?;

    let existed = vault.get_secret(name)?.is_some();
    vault.set_secret(name, secret_value.as_bytes())?;

    let verb = if existed { "updated" } else { "saved" };
    output::success(&format!("Secret '{name}' {verb} in {}", vault.path().display()));
    output::tip("Check it: toolvault status");

    Ok(())
}
