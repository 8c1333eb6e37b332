use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Remote transcode host contract
        .route("/ping", get(handlers::ping))
        .route("/transcode", get(handlers::transcode))
        .route("/stop", get(handlers::stop))
        // Controller side
        .route("/play", get(handlers::play))
        // Observability
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
