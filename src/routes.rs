use axum::{routing::get, routing::post, Router};
use tower_http::limit::RequestBodyLimitLayer;
use crate::{handlers, state::AppState};

/// Display names are tiny; anything past this is not a real request
const MAX_BODY_BYTES: usize = 4 * 1024;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/validate-display-name", post(handlers::validate_display_name))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
