//! Sensor record types shared by the store and the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted sensor observation.
///
/// The identifier is assigned by the store on creation and is immutable.
/// The payload is flattened into the record, so a diode record serializes
/// as `{"id": ..., "status": true, "date": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord<P> {
    pub id: String,
    #[serde(flatten)]
    pub payload: P,
    pub date: DateTime<Utc>,
}

/// Diode state payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiodePayload {
    pub status: bool,
}

/// Floating-point measurement payload, shared by light intensity,
/// temperature, water level and humidity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPayload {
    pub value: f64,
}

pub type DiodeRecord = SensorRecord<DiodePayload>;
pub type MeasurementRecord = SensorRecord<MeasurementPayload>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_flattens_into_record() {
        let record = SensorRecord {
            id: "0".repeat(24),
            payload: DiodePayload { status: true },
            date: "2025-01-10T12:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], true);
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_measurement_roundtrip() {
        let json = serde_json::json!({
            "id": "64b5f0c2a1b2c3d4e5f60718",
            "value": 42.5,
            "date": "2025-01-10T12:00:00Z",
        });
        let record: MeasurementRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.payload.value, 42.5);
    }
}
