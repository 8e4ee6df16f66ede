//! `toolvault reset` — delete the vault file and every stored secret.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, open_vault, Cli};
use crate::errors::{Result, ToolVaultError};

/// Execute the `reset` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let vault = open_vault(cli, &settings)?;

    if !vault.exists() {
        output::info("No vault file; nothing to reset.");
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} and every secret in it?",
                vault.path().display()
            ))
            .default(false)
            .interact()
            .map_err(|e| ToolVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    vault.reset()?;
    output::success("Vault reset");
    output::tip("Store tokens again with: toolvault save <name>");
    Ok(())
}
