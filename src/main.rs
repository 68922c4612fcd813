#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::ExposeSecret;
use tracing::{error, info, warn};

mod audit;
mod cli;
mod config;
mod db;
mod discord;
mod reddit;
mod utils;
mod web;

use audit::AuditLog;
use cli::Cli;
use config::Config;
use discord::DiscordClient;
use web::{PanelState, WebServer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(
        Config::load_from_file(&cli.config)
            .with_context(|| format!("failed loading config from {}", cli.config.display()))?,
    );
    utils::logging::init_tracing(&config.logging, cli.log_level.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), "reddit watch panel starting up");

    let db_manager = db::DatabaseManager::new(&config.database).await?;
    db_manager.migrate().await?;
    info!(db_type = ?db_manager.db_type(), "database ready");

    let audit = Arc::new(AuditLog::spawn(
        db_manager.audit_store(),
        config.audit.queue_capacity,
    ));
    let directory = Arc::new(DiscordClient::new(config.auth.bot_token.expose_secret()));

    let state = PanelState {
        watch_store: db_manager.watch_store(),
        audit_store: db_manager.audit_store(),
        audit: audit.clone(),
        directory,
        access_token: config.auth.access_token.clone(),
        limits: config.limits.clone(),
        cp_prefix: config.panel.cp_prefix.clone(),
        started_at: Instant::now(),
    };

    let web_server = WebServer::new(config.clone(), state);
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("web server error: {}", e);
        }
    });

    tokio::select! {
        _ = web_handle => {},
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("failed listening for shutdown signal: {}", e);
            }
        },
    }

    info!("reddit watch panel shutting down");
    let timeout = Duration::from_secs(config.audit.shutdown_timeout_secs);
    if !audit.shutdown(timeout).await {
        warn!("some audit entries were not written before shutdown");
    }
    Ok(())
}
