//! tripmeter server
//!
//! - Trip routes: `/trip`, `/trip/:id`
//! - Operational: `/healthz`, `/hello`, `/metrics`
//! - Config: `TRIPMETER_CONFIG` (default `tripmeter.yaml`), `PORT` override

use tracing_subscriber::{fmt, EnvFilter};

use tripmeter_core::error::{Result, TripmeterError};
use tripmeter_server::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "tripmeter.yaml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "tripmeter-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let path = std::env::var("TRIPMETER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let port = std::env::var("PORT").ok();
    let cfg = config::load_or_default(&path, port.as_deref())?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "tripmeter-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| TripmeterError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TripmeterError::Internal(format!("server failed: {e}")))?;

    tracing::info!("tripmeter-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
