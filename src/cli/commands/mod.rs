//! One module per subcommand; each exposes an `execute` function.

pub mod delete;
pub mod dispatch;
pub mod operations;
pub mod reset;
pub mod save;
pub mod status;
