//! Command parsing and dispatch
//!
//! `component-cli [--config PATH] <command> [args...]`. Every command prints
//! one JSON document on stdout.

use std::sync::Arc;

use anyhow::Context;
use cache_store::CacheStore;
use clap::{Parser, Subcommand};
use component_auth::{Component, VerifyTicketStore};
use serde_json::{Value, json};
use tracing::info;

/// Operator CLI for the component authorization client
#[derive(Debug, Parser)]
#[command(name = "component-cli")]
#[command(about = "WeChat open platform component authorization client")]
pub struct Cli {
    /// Config file (falls back to CONFIG_PATH, then component-cli.toml)
    #[arg(long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Store a pushed verify ticket (needs no app secret)
    SetTicket { ticket: String },
    #[command(flatten)]
    Api(ApiCommand),
}

/// Commands that talk to the component API.
#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum ApiCommand {
    /// Print the cached component access token, refreshing if needed
    Token {
        /// Bypass the cache and mint a new token
        #[arg(long)]
        force: bool,
    },
    /// Build the consent page URL for an identification
    LoginUrl {
        redirect: String,
        identification: String,
    },
    /// Evict a consumed pre-auth code
    ForgetPreAuth { identification: String },
    /// Exchange an authorization code for tenant credentials
    QueryAuth { code: String },
    AuthorizerInfo { appid: String },
    GetOption { appid: String, name: String },
    SetOption {
        appid: String,
        name: String,
        value: String,
    },
}

/// Store a pushed verify ticket. Needs no app secret.
pub async fn store_ticket(
    cache: Arc<dyn CacheStore>,
    app_id: &str,
    ticket: &str,
) -> anyhow::Result<Value> {
    let store = VerifyTicketStore::new(cache, app_id);
    store
        .set(ticket)
        .await
        .context("failed to store verify ticket")?;
    info!(app_id, "verify ticket stored");
    Ok(json!({ "stored": true, "key": store.key() }))
}

/// Run a command against the component client.
pub async fn execute(command: ApiCommand, component: &Component) -> anyhow::Result<Value> {
    let output = match command {
        ApiCommand::Token { force } => {
            let token = component
                .tokens()
                .get_token(force)
                .await
                .context("failed to obtain component access token")?;
            json!({ "component_access_token": token })
        }
        ApiCommand::LoginUrl {
            redirect,
            identification,
        } => {
            let url = component
                .login_page(&redirect, &identification)
                .await
                .context("failed to build login page url")?;
            json!({ "url": url })
        }
        ApiCommand::ForgetPreAuth { identification } => {
            let forgotten = component
                .forget_pre_auth_code(&identification)
                .await
                .context("failed to forget pre-auth code")?;
            json!({ "forgotten": forgotten })
        }
        ApiCommand::QueryAuth { code } => component
            .query_auth(&code)
            .await
            .context("authorization code exchange failed")?,
        ApiCommand::AuthorizerInfo { appid } => component
            .get_authorizer_info(&appid)
            .await
            .with_context(|| format!("failed to get authorizer info for {appid}"))?,
        ApiCommand::GetOption { appid, name } => component
            .get_authorizer_option(&appid, &name)
            .await
            .with_context(|| format!("failed to get option {name} for {appid}"))?,
        ApiCommand::SetOption { appid, name, value } => component
            .set_authorizer_option(&appid, &name, &value)
            .await
            .with_context(|| format!("failed to set option {name} for {appid}"))?,
    };
    Ok(output)
}
