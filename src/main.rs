//! Taskhub server entry point.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use taskhub::api;
use taskhub::cli::{Cli, Command};
use taskhub::config::{ConfigLoader, ConfigPaths, ENV_CONFIG_PATH};
use taskhub::db::Database;
use taskhub::logging::{self, LogTarget};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let explicit = cli.config.clone();
    let loader = ConfigLoader::load_with(ConfigPaths::discover(), |key| {
        if key == ENV_CONFIG_PATH && explicit.is_some() {
            return explicit.clone();
        }
        std::env::var(key).ok()
    })?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "using config file");
    }
    let mut config = loader.into_config();
    cli.apply_overrides(&mut config);

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Arc::new(Database::open(&config.database.path)?);
    info!(path = %config.database.path.display(), "Database initialized successfully");

    match cli.command() {
        Command::InitDb => Ok(()),
        Command::Serve => {
            let handle = api::start_server(db, &config.server).await?;
            tokio::signal::ctrl_c().await?;
            info!("Received ctrl-c");
            handle.shutdown().await;
            Ok(())
        }
    }
}
