//! `toolvault status` — show which known secrets are stored.

use crate::cli::output;
use crate::cli::{load_settings, open_vault, Cli};
use crate::errors::Result;

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let vault = open_vault(cli, &settings)?;

    let status = vault.status()?;
    let stored = status.values().filter(|s| s.exists).count();

    output::info(&format!(
        "{} — {stored} of {} known secret(s) stored",
        vault.path().display(),
        status.len()
    ));
    output::print_status_table(&status);

    Ok(())
}
