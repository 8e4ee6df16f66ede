use clap::Parser;
use tracing_subscriber::EnvFilter;

use toolvault::cli::{log_level, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose));

    let result = match cli.command {
        Commands::Dispatch {
            ref operation,
            ref params,
            pretty,
        } => {
            toolvault::cli::commands::dispatch::execute(&cli, operation, params.as_deref(), pretty)
                .await
        }
        Commands::Operations => toolvault::cli::commands::operations::execute(),
        Commands::Status => toolvault::cli::commands::status::execute(&cli),
        Commands::Save {
            ref name,
            ref value,
        } => toolvault::cli::commands::save::execute(&cli, name, value.as_deref()),
        Commands::Delete { ref name, force } => {
            toolvault::cli::commands::delete::execute(&cli, name, force)
        }
        Commands::Reset { force } => toolvault::cli::commands::reset::execute(&cli, force),
    };

    if let Err(e) = result {
        toolvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins
/// over the `-v` level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
