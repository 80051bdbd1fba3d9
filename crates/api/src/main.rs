//! Lexbook - legal consultation booking service
//!
//! Main entry point: loads configuration, runs migrations, starts the
//! expiration scheduler and serves the HTTP API until shutdown.

use std::sync::Arc;

use lexbook_api::{create_router, AppContext};
use lexbook_infra::Config;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lexbook=info,lexbook_infra=info,lexbook_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env file, using process environment"),
    }

    let config = Config::from_env()?;
    let bind_addr = config.server.bind_addr;

    let ctx = Arc::new(AppContext::new(config)?);
    info!(db_path = %ctx.db.path().display(), "lexbook starting");

    let mut scheduler = ctx.expiration_scheduler();
    scheduler.start().await?;

    let app = create_router(ctx);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    if let Err(err) = scheduler.stop().await {
        error!(error = %err, "scheduler did not stop cleanly");
    }
    info!("lexbook stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
