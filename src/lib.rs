pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod executor;
pub mod router;
pub mod translate;
pub mod vault;
