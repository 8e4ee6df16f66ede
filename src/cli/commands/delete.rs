//! `toolvault delete` — remove a secret from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, open_vault, Cli};
use crate::errors::{Result, ToolVaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete secret '{name}'?"))
            .default(false)
            .interact()
            .map_err(|e| ToolVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let settings = load_settings(cli)?;
    let vault = open_vault(cli, &settings)?;

    if !vault.delete_secret(name)? {
        return Err(ToolVaultError::SecretNotFound(name.to_string()));
    }

    output::success(&format!("Deleted secret '{name}'"));
    Ok(())
}
