//! Greenhouse Telemetry API server entry point.
//!
//! Startup sequence:
//! 1. Load `.env` and read configuration
//! 2. Connect to the document store (fatal on failure)
//! 3. Initialize the identity provider if credentials are present
//! 4. Bind the router and serve

use greenhouse_api::domain::config::AppConfig;
use greenhouse_api::providers::RemoteIdentityProvider;
use greenhouse_api::router::{build_router, AppState};
use greenhouse_api::store::{connect, SensorStores};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Boot-time hard dependency: no store, no server.
    let db = match connect(&config.mongodb_uri, &config.mongodb_db_name).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to MongoDB: {e}");
            std::process::exit(1);
        }
    };

    let identity = config.identity.as_ref().map(|creds| {
        info!(project_id = %creds.project_id, "Identity provider configured");
        Arc::new(RemoteIdentityProvider::new(
            creds.verify_url.clone(),
            creds.api_key.clone(),
            creds.project_id.clone(),
        )) as Arc<dyn greenhouse_api::providers::IdentityProvider>
    });

    if config.jwt_secret.is_none() {
        info!("JWT_SECRET not set; local-token routes will report the missing secret");
    }

    let addr = config.bind_addr();
    let state = AppState {
        config: Arc::new(config),
        stores: Arc::new(SensorStores::mongo(&db)),
        identity,
    };
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("Server is running on port {}", addr.port());
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
