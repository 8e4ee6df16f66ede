//! `toolvault operations` — list what `dispatch` accepts.

use crate::cli::output;
use crate::errors::Result;
use crate::router::Operation;

/// Execute the `operations` command.
pub fn execute() -> Result<()> {
    output::info(&format!("{} operations", Operation::ALL.len()));
    output::print_operations_table();
    output::tip("Run one: toolvault dispatch \"secret status\"");
    Ok(())
}
