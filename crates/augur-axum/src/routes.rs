//! Route definitions and router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::bootstrap::RelayContext;
use crate::ws;

/// Build the relay router over an assembled context.
pub fn create_router(ctx: RelayContext) -> Router {
    Router::new()
        .route("/ws", get(ws::relay_ws))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(ctx))
}
