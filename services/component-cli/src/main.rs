//! Component authorization CLI
//!
//! Operator tool over the `component-auth` crate:
//! 1. Loads the platform identity from TOML + env
//! 2. Opens the shared file cache
//! 3. Runs one command (store ticket, mint token, build login URL, ...)
//! 4. Prints the JSON result on stdout; logs go to stderr

mod command;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cache_store::{CacheStore, FileCache};
use clap::Parser;
use component_auth::Component;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::HttpTransport;

use crate::command::{Cli, Command};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        app_id = %config.component.app_id,
        api_base = %config.component.api_base,
        cache_path = %config.cache.path.display(),
        "configuration loaded"
    );

    let cache: Arc<dyn CacheStore> = Arc::new(
        FileCache::load(config.cache.path.clone())
            .await
            .with_context(|| format!("failed to open cache {}", config.cache.path.display()))?,
    );

    let output = match cli.command {
        Command::SetTicket { ticket } => {
            command::store_ticket(cache, &config.component.app_id, &ticket).await?
        }
        Command::Api(api) => {
            let component_config = config.component_config()?;
            let transport =
                HttpTransport::new(Duration::from_secs(config.component.timeout_secs))
                    .context("failed to build HTTP transport")?;
            let component = Component::new(component_config, cache, Arc::new(transport));
            command::execute(api, &component).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
