//! Executor module — runs external command-line tools.
//!
//! - `ProcessInvocation` / `ProcessOutcome` describe one run (`invocation`)
//! - `CommandExecutor` spawns, times out and collects output (`runner`)

pub mod invocation;
pub mod runner;

pub use invocation::{ProcessInvocation, ProcessOutcome, Termination};
pub use runner::{CommandExecutor, DEFAULT_TIMEOUT, MAX_TIMEOUT};
