//! HTTP surface: route table, shared state, fallback.

use crate::domain::config::AppConfig;
use crate::handlers::{auth, health, records};
use crate::middleware::{
    validation::{
        diode_rules, humidity_rules, light_intensity_rules, temperature_rules, water_level_rules,
    },
    JwtAuthLayer, RequestTracingLayer, ValidationLayer,
};
use crate::providers::IdentityProvider;
use crate::store::SensorStores;
use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: Arc<SensorStores>,
    /// Present when provider credentials were configured at boot. The
    /// identity-provider scheme verifies against this handle.
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

pub fn build_router(state: AppState) -> Router {
    let jwt = JwtAuthLayer::new(state.config.jwt_secret.clone());
    let tracing_layer = RequestTracingLayer::new(state.config.debug_requests);

    let auth_routes = Router::new()
        .route("/test-tokens", get(auth::test_tokens))
        .route("/me", get(auth::current_user).route_layer(jwt.clone()));

    let db_routes = Router::new()
        .route("/health", get(health::database_health))
        .route(
            "/health-token",
            get(health::database_health).route_layer(jwt),
        )
        .route(
            "/diodes",
            get(records::list_diodes)
                .post(records::create_diode)
                .route_layer(ValidationLayer::body(diode_rules())),
        )
        .route(
            "/diodes/date-range",
            get(records::diodes_by_date_range).route_layer(ValidationLayer::date_range()),
        )
        .route(
            "/light-intensity",
            get(records::list_light_intensity)
                .post(records::create_light_intensity)
                .route_layer(ValidationLayer::body(light_intensity_rules())),
        )
        .route(
            "/light-intensity/date-range",
            get(records::light_intensity_by_date_range)
                .route_layer(ValidationLayer::date_range()),
        )
        .route(
            "/temperatures",
            get(records::list_temperatures)
                .post(records::create_temperature)
                .route_layer(ValidationLayer::body(temperature_rules())),
        )
        .route(
            "/temperatures/date-range",
            get(records::temperatures_by_date_range).route_layer(ValidationLayer::date_range()),
        )
        .route(
            "/water-levels",
            get(records::list_water_levels)
                .post(records::create_water_level)
                .route_layer(ValidationLayer::body(water_level_rules())),
        )
        .route(
            "/water-levels/date-range",
            get(records::water_levels_by_date_range).route_layer(ValidationLayer::date_range()),
        )
        .route(
            "/humidities",
            get(records::list_humidities)
                .post(records::create_humidity)
                .route_layer(ValidationLayer::body(humidity_rules())),
        )
        .route(
            "/humidities/date-range",
            get(records::humidities_by_date_range).route_layer(ValidationLayer::date_range()),
        );

    Router::new()
        .route("/", get(health::root_ping))
        .nest("/auth", auth_routes)
        .nest("/api/db", db_routes)
        .fallback(not_found)
        .layer(tracing_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Unmatched routes get a plain 404 shape, not the API envelope.
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": "error",
            "message": format!("Route {} not found", uri),
        })),
    )
}
