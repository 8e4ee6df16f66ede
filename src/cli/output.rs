//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command. Result JSON from `dispatch`
//! is printed plain so it stays machine-readable.

use std::collections::BTreeMap;

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::router::Operation;
use crate::vault::SecretStatus;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of known secrets (Name, Stored, Saved at).
pub fn print_status_table(status: &BTreeMap<String, SecretStatus>) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Stored", "Saved at"]);

    for (name, s) in status {
        table.add_row(vec![
            name.clone(),
            if s.exists { "yes" } else { "no" }.to_string(),
            s.saved_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{table}");

    if status.values().all(|s| !s.exists) {
        tip("Run `toolvault save <name>` to store your first token.");
    }
}

/// Print a table of every operation (Name, Kind, Description).
pub fn print_operations_table() {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Operation", "Kind", "Description"]);

    for op in Operation::ALL {
        let kind = if op.is_tool_backed() { "tool" } else { "local" };
        table.add_row(vec![op.name(), kind, op.description()]);
    }

    println!("{table}");
}
