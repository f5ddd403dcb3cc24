//! Liveness endpoint.
//!
//! Hosting platforms expect the process to bind a port, so a tiny HTTP server
//! answers `GET /` alongside the socket-mode listener.

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::base::types::Void;

/// Body returned by the liveness route.
pub const HEALTH_RESPONSE: &str = "Hello, World!";

/// Builds the health router.
pub fn router() -> Router {
    Router::new().route("/", get(handle_health))
}

/// `GET /`
async fn handle_health() -> &'static str {
    HEALTH_RESPONSE
}

/// Binds `0.0.0.0:<port>` and serves until the process exits.
#[instrument]
pub async fn serve(port: u16) -> Void {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    serve_on(listener).await
}

/// Serves the health router on an already-bound listener.
pub async fn serve_on(listener: TcpListener) -> Void {
    info!("Health endpoint listening on {}.", listener.local_addr()?);

    axum::serve(listener, router()).await?;

    Ok(())
}

// Tests.
