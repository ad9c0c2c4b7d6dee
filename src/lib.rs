// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Greenhouse Telemetry API - HTTP ingestion surface for sensor readings.
//!
//! Five sensor resources (diodes, light intensity, temperatures, water
//! levels, humidities) share one generic record pipeline:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     HTTP (axum router)                    │
//! ├──────────────────────────────────────────────────────────┤
//! │  Middleware Stack                                         │
//! │  RequestTracing → Validation → Auth (local | provider)   │
//! ├──────────────────────────────────────────────────────────┤
//! │  Generic record operations                                │
//! │  list · create · list-by-date-range                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  RecordStore<P>  (MongoDB, one collection per resource)  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every response carries the canonical envelope (see [`response`]), and
//! every failure one code from the closed taxonomy in
//! [`domain::error::ErrorCode`].
//!
//! # Usage
//!
//! ```ignore
//! use greenhouse_api::domain::config::AppConfig;
//! use greenhouse_api::router::{build_router, AppState};
//! use greenhouse_api::store::{connect, SensorStores};
//!
//! let config = AppConfig::from_env()?;
//! let db = connect(&config.mongodb_uri, &config.mongodb_db_name).await?;
//! let app = build_router(AppState {
//!     config: Arc::new(config),
//!     stores: Arc::new(SensorStores::mongo(&db)),
//!     identity: None,
//! });
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod providers;
pub mod response;
pub mod router;
pub mod store;

// Re-exports for public API
pub use domain::config::AppConfig;
pub use domain::error::{ApiError, ErrorCode, FieldError};
pub use domain::record::{DiodePayload, MeasurementPayload, SensorRecord};
pub use response::ApiSuccess;
pub use router::{build_router, AppState};
pub use store::{RecordFilter, RecordStore, SensorStores, StoreError};
