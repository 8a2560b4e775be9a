use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use toolrelay_core::{Relay, SessionLimits};

use crate::routes::{self, AppState};

/// Serve until Ctrl-C
pub async fn run(relay: &Relay, host: &str, port: u16, limits: SessionLimits) -> Result<()> {
    let state = AppState {
        sessions: Arc::new(relay.sessions().with_limits(limits)),
    };
    let app = routes::routes(state);

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on http://{}", listener.local_addr()?);
    println!("Serving on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
