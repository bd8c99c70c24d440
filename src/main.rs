//! filerelay binary entry point.

use clap::Parser;
use filerelay::Settings;
use filerelay::cli::{Cli, Commands, WatchArgs, commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    let result = match cli.command.unwrap_or(Commands::Watch(WatchArgs::default())) {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Config => commands::init::run_config(&config),
        Commands::Watch(args) => {
            filerelay::logging::init_with_config(&config.logging);
            commands::watch::run(args, config).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
