//! Typed collection bindings.
//!
//! Five instantiations of the record store, each bound to its own
//! collection name and payload shape. No behavior beyond the binding.

use crate::domain::record::{DiodePayload, MeasurementPayload};
use crate::store::{MongoRecordStore, RecordStore};
use mongodb::Database;
use std::sync::Arc;

pub const DIODE_COLLECTION: &str = "diode_status_collection";
pub const LIGHT_INTENSITY_COLLECTION: &str = "light_intensity_collection";
pub const TEMPERATURE_COLLECTION: &str = "temperature_collection";
pub const WATER_LEVEL_COLLECTION: &str = "water_level_collection";
pub const HUMIDITY_COLLECTION: &str = "humidity_collection";

/// The five record stores, one per sensor resource. Each store
/// exclusively owns its collection.
#[derive(Clone)]
pub struct SensorStores {
    pub diodes: Arc<dyn RecordStore<DiodePayload>>,
    pub light_intensity: Arc<dyn RecordStore<MeasurementPayload>>,
    pub temperatures: Arc<dyn RecordStore<MeasurementPayload>>,
    pub water_levels: Arc<dyn RecordStore<MeasurementPayload>>,
    pub humidities: Arc<dyn RecordStore<MeasurementPayload>>,
}

impl SensorStores {
    /// Bind all five stores to their MongoDB collections.
    pub fn mongo(db: &Database) -> Self {
        Self {
            diodes: Arc::new(MongoRecordStore::new(db, DIODE_COLLECTION)),
            light_intensity: Arc::new(MongoRecordStore::new(db, LIGHT_INTENSITY_COLLECTION)),
            temperatures: Arc::new(MongoRecordStore::new(db, TEMPERATURE_COLLECTION)),
            water_levels: Arc::new(MongoRecordStore::new(db, WATER_LEVEL_COLLECTION)),
            humidities: Arc::new(MongoRecordStore::new(db, HUMIDITY_COLLECTION)),
        }
    }
}
