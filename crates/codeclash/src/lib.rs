//! # CodeClash - Battle Client Entry Point
//!
//! Headless client for CodeClash 1v1 battles. This entry point handles CLI
//! parsing, configuration loading, logging and the application lifecycle.
//!
//! ## Quick Start
//!
//! ```bash
//! # Log in once and search for a STANDARD match
//! codeclash --token "$JWT"
//!
//! # Later runs reuse the stored token
//! codeclash --mode BLITZ
//!
//! # Rejoin the match persisted by a previous run
//! codeclash --resume
//!
//! # JSON logging
//! codeclash --json-logs --log-level debug
//! ```
//!
//! ## Configuration
//!
//! The client loads configuration from a TOML file (default: `codeclash.toml`).
//! If the file doesn't exist, a default configuration will be created.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

pub use app::Application;
pub use cli::CliArgs;
pub use config::{AppConfig, ClientSettings, LoggingSettings, ServerSettings};

/// Runs the client. Exits the process with code 1 on failure.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging has to exist before the application logs anything, so the
    // file is read once up front with CLI overrides for the level.
    let mut logging_settings = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default()
        .logging;
    if let Some(level) = &args.log_level {
        logging_settings.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Battle session failed: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start client: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
