use std::process::ExitCode;

use clap::Parser;
use page_indexer::cli::commands::{config, manifests, sync, watch};
use page_indexer::cli::{Cli, Commands};
use page_indexer::{Settings, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Settings::default_config_path);
    let settings = match Settings::load_from(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let command = cli.into_command();

    // Only the long-running watcher writes a log file
    let log_dir = match command {
        Commands::Watch { .. } if settings.logging.file => Some(settings.state_dir()),
        _ => None,
    };
    let _log_guard = logging::init_with_config(&settings.logging, log_dir.as_deref());

    let state_dir = settings.state_dir();
    let result = match command {
        Commands::Watch { manifest } => watch::run(settings, manifest.as_deref()).await,
        Commands::Add { manifest } => manifests::run_add(&state_dir, &manifest),
        Commands::Remove { manifest } => manifests::run_remove(&state_dir, &manifest),
        Commands::List => manifests::run_list(&state_dir),
        Commands::Sync { manifest } => sync::run(&settings, &manifest).await,
        Commands::Config { save } => {
            config::run_config(&settings, save.then_some(config_path.as_path()))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
