use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use salvo::prelude::*;
use secrecy::SecretString;
use serde_json::json;
use tracing::info;

use crate::audit::AuditLog;
use crate::config::{Config, LimitsConfig};
use crate::db::{AuditStore, WatchStore};
use crate::discord::GuildDirectory;

pub mod form;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod template;

use self::middleware::auth::create_router;

/// Shared services, injected into every request's depot.
#[derive(Clone)]
pub struct PanelState {
    pub watch_store: Arc<dyn WatchStore>,
    pub audit_store: Arc<dyn AuditStore>,
    pub audit: Arc<AuditLog>,
    pub directory: Arc<dyn GuildDirectory>,
    pub access_token: SecretString,
    pub limits: LimitsConfig,
    pub cp_prefix: String,
    pub started_at: Instant,
}

pub(crate) fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(json!({ "error": message })));
}

pub struct WebServer {
    config: Arc<Config>,
    state: PanelState,
}

impl WebServer {
    pub fn new(config: Arc<Config>, state: PanelState) -> Self {
        Self { config, state }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.panel.bind_address, self.config.panel.port
        );
        info!("Starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor)
            .serve(create_router(self.state.clone()))
            .await;

        Ok(())
    }
}
