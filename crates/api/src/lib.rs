//! Keepalive HTTP endpoint.
//!
//! The hosting platform only keeps processes that accept HTTP traffic, so the
//! bridge answers every request with a fixed 200.

pub mod routes;

use std::net::SocketAddr;

use tower_http::trace::TraceLayer;

use crate::routes::create_router;

/// Bind `0.0.0.0:{port}` and serve the keepalive router until the task ends.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let app = create_router().layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Keepalive server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
