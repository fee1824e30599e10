//! `deskbridge serve`: run the billing webhook endpoint.

use std::sync::Arc;

use clap::Args;
use deskbridge_reconcile::ReconciliationEngine;
use deskbridge_webhooks::{webhooks_router, WebhooksState};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::shutdown::shutdown_signal;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the PORT environment variable
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, mut config: AppConfig) -> AppResult<()> {
    if let Some(port) = args.port {
        config.port = port;
    }

    let engine = ReconciliationEngine::from_config(config.engine_config())?;
    if config.webhook_credentials.is_none() {
        warn!("WEBHOOK_USERNAME/WEBHOOK_PASSWORD not set, webhook endpoint is unauthenticated");
    }
    let state = WebhooksState::new(Arc::new(engine), config.webhook_credentials.clone());
    let app = webhooks_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Server)?;
    info!(addr = %addr, "Listening for billing webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("Server shutdown complete");
    Ok(())
}
