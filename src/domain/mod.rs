//! Domain types: configuration, errors, records.

pub mod config;
pub mod error;
pub mod record;

pub use config::{AppConfig, ConfigError, IdentityConfig};
pub use error::{ApiError, ErrorCode, FieldError};
pub use record::{DiodePayload, DiodeRecord, MeasurementPayload, MeasurementRecord, SensorRecord};
