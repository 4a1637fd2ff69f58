use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::{
    error::GateError,
    gate::{Identity, Verdict},
    health::HealthStatus,
    models::ValidateDisplayNameRequest,
    state::AppState,
};

pub async fn validate_display_name(
    State(state): State<AppState>,
    Json(request): Json<ValidateDisplayNameRequest>,
) -> Result<Json<Verdict>, (StatusCode, Json<Value>)> {
    let identity = Identity::from_caller(request.caller_identity.as_deref());
    let display_name = request.display_name_text();

    state
        .gate
        .check(&display_name, &identity)
        .await
        .map(Json)
        .map_err(GateError::into_http)
}

/// Health check endpoint for load balancer
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, StatusCode> {
    let health = HealthStatus::check(&state.store).await;

    if health.healthy {
        Ok(Json(health))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
