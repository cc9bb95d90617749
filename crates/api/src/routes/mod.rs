pub mod keepalive;

use axum::Router;

/// Build the complete keepalive router.
pub fn create_router() -> Router {
    Router::new().merge(keepalive::router())
}
