//! Liveness probes.

use crate::domain::error::ApiError;
use crate::response::{envelope_timestamp, ApiSuccess};
use crate::router::AppState;
use crate::store::RecordFilter;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// One lightweight store round-trip; any store failure means unhealthy.
pub async fn database_health(State(state): State<AppState>) -> Response {
    match state.stores.diodes.count(&RecordFilter::all()).await {
        Ok(_) => ApiSuccess::new(json!({
            "status": "healthy",
            "database": "connected",
            "timestamp": envelope_timestamp(),
        }))
        .with_message("Database health check passed")
        .into_response(),
        Err(e) => ApiError::database(
            "Database health check failed",
            &e.to_string(),
            state.config.development,
        )
        .into_response(),
    }
}

/// GET /. Plain-text ping, no store round-trip.
pub async fn root_ping() -> &'static str {
    "Greenhouse telemetry API is running"
}
