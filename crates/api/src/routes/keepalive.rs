//! Catch-all liveness responder.

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

/// Body returned for every request.
pub const ALIVE_MESSAGE: &str = "El Bot de Notificaciones esta vivo 🤖";

pub fn router() -> Router {
    Router::new().fallback(alive)
}

async fn alive() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ALIVE_MESSAGE,
    )
}
