//! Liveness endpoint.
//!
//! A minimal HTTP server that answers 200 to any request, so container
//! orchestrators can tell the process is alive. It says nothing about
//! scan health; cycle outcomes go to the log.

use axum::Router;
use axum::http::StatusCode;

/// Builds the liveness router: every method and path gets 200.
pub fn router() -> Router {
    Router::new().fallback(alive)
}

async fn alive() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ordersentry OK\n")
}

/// Binds the listener and serves until the process exits.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "liveness endpoint listening");
    axum::serve(listener, router()).await
}
