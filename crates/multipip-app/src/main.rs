mod bridge;
mod cli;

use std::process::ExitCode;

use multipip_common::MultipipError;
use multipip_config::{toml_loader, SettingsStore};
use tracing_subscriber::EnvFilter;

use cli::Command;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let settings = match open_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("multipip: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to stderr; stdout carries bridge responses.
    let config = settings.current();
    let log_directive = args
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_directive());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
            ),
        )
        .init();

    tracing::info!("multipip v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = settings.path() {
        tracing::info!(path = %path.display(), "settings loaded");
    }

    let result = match args.command {
        Command::Bridge { document } => bridge::run(settings, &document).await,
        Command::Config { print } => {
            if print {
                println!("{}", multipip_config::config_to_json(&config));
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => {
            tracing::info!("shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "multipip failed");
            ExitCode::FAILURE
        }
    }
}

fn open_settings(args: &cli::Args) -> Result<SettingsStore, MultipipError> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => toml_loader::default_config_path()?,
    };
    Ok(SettingsStore::open(path)?)
}
