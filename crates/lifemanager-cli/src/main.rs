//! Life Manager CLI - sign in, check the session and submit documents
//! from the terminal.
//!
//! Every command restores the saved session first, so a login from a
//! previous run is picked up automatically.

mod cli;
mod screens;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use lifemanager_core::{ApiClient, Config, SessionManager, StorageMode, TokenStore};
use screens::document_form::DocumentForm;

// ============================================================================
// Constants
// ============================================================================

const API_URL_ENV: &str = "LIFEMANAGER_API_URL";

const TOKEN_STORAGE_ENV: &str = "LIFEMANAGER_TOKEN_STORAGE";

/// When set, logs go to a daily file in this directory instead of stderr
const LOG_DIR_ENV: &str = "LIFEMANAGER_LOG_DIR";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lifemanager.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

/// Layer overrides on top of the config file: environment, then flags.
fn apply_overrides(
    mut config: Config,
    env_api_url: Option<String>,
    env_token_storage: Option<String>,
    cli: &Cli,
) -> Result<Config> {
    if let Some(url) = env_api_url {
        config.api_url = Some(url);
    }
    if let Some(mode) = env_token_storage {
        config.token_storage = mode
            .parse::<StorageMode>()
            .with_context(|| format!("Invalid {}", TOKEN_STORAGE_ENV))?;
    }
    if let Some(ref url) = cli.api_url {
        config.api_url = Some(url.clone());
    }
    if let Some(mode) = cli.token_storage {
        config.token_storage = mode;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    let config = apply_overrides(
        config,
        std::env::var(API_URL_ENV).ok(),
        std::env::var(TOKEN_STORAGE_ENV).ok(),
        &cli,
    )?;

    let store = TokenStore::from_config(&config)
        .await
        .context("Failed to open token storage")?;
    let api = ApiClient::from_config(&config).context("Invalid backend address")?;
    let session = Arc::new(SessionManager::new(api, store));

    session.restore().await;
    info!(phase = %session.phase(), base_url = %config.api_base_url(), "Life Manager CLI starting");

    match cli.command {
        Command::Login { username } => {
            screens::login::run(&session, config.last_username.as_deref(), username).await
        }
        Command::Logout => screens::home::logout(&session).await,
        Command::Status => {
            screens::home::status(&session);
            Ok(())
        }
        Command::Protected => screens::home::protected(&session).await,
        Command::Submit {
            title,
            content,
            id,
            file,
            json,
        } => {
            let form = DocumentForm {
                id,
                title,
                content,
                file,
                as_json: json,
            };
            screens::document_form::submit(&session, form).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["lifemanager"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_env_overrides_config_file() {
        let config = apply_overrides(
            Config::default(),
            Some("http://env-host:3000".to_string()),
            Some("file".to_string()),
            &cli(&["status"]),
        )
        .unwrap();
        assert_eq!(config.api_base_url(), "http://env-host:3000");
        assert_eq!(config.token_storage, StorageMode::File);
    }

    #[test]
    fn test_flags_override_env() {
        let config = apply_overrides(
            Config::default(),
            Some("http://env-host:3000".to_string()),
            Some("file".to_string()),
            &cli(&["status", "--api-url", "http://flag-host", "--token-storage", "memory"]),
        )
        .unwrap();
        assert_eq!(config.api_base_url(), "http://flag-host");
        assert_eq!(config.token_storage, StorageMode::Memory);
    }

    #[test]
    fn test_bad_env_storage_mode() {
        let result = apply_overrides(
            Config::default(),
            None,
            Some("cloud".to_string()),
            &cli(&["status"]),
        );
        assert!(result.is_err());
    }
}
