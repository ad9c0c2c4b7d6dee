//! Sensor record handlers.
//!
//! Three generic operations (list, create, list by date range) written once
//! over `dyn RecordStore<P>` and instantiated per resource by thin
//! wrappers. Store failures never propagate raw: every one is rendered as
//! a DATABASE_ERROR with a resource-specific message.

use crate::domain::error::{ApiError, ErrorCode, FieldError};
use crate::response::ApiSuccess;
use crate::router::AppState;
use crate::store::{RecordFilter, RecordStore};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

/// Display names for one resource, as used in response messages.
/// `plural` leads retrieval messages; `singular` leads creation messages.
#[derive(Debug, Clone, Copy)]
pub struct ResourceName {
    pub plural: &'static str,
    pub singular: &'static str,
}

const DIODES: ResourceName = ResourceName {
    plural: "Diodes",
    singular: "Diode",
};
const LIGHT_INTENSITY: ResourceName = ResourceName {
    plural: "Light intensity records",
    singular: "Light intensity record",
};
const TEMPERATURES: ResourceName = ResourceName {
    plural: "Temperature records",
    singular: "Temperature record",
};
const WATER_LEVELS: ResourceName = ResourceName {
    plural: "Water level records",
    singular: "Water level record",
};
const HUMIDITIES: ResourceName = ResourceName {
    plural: "Humidity records",
    singular: "Humidity record",
};

/// Read an optional positive integer query parameter. Absent, non-numeric
/// or zero all mean "unset".
fn parse_index(query: &HashMap<String, String>, key: &str) -> Option<u64> {
    query
        .get(key)
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|n| *n > 0)
}

fn pagination(total: u64, count: usize, limit: Option<u64>, skip: Option<u64>) -> Value {
    json!({
        "total": total,
        "count": count,
        "limit": limit.unwrap_or(total),
        "skip": skip.unwrap_or(0),
    })
}

async fn list_records<P>(
    store: &dyn RecordStore<P>,
    resource: ResourceName,
    query: &HashMap<String, String>,
    development: bool,
) -> Response
where
    P: Serialize + Send + Sync,
{
    let limit = parse_index(query, "limit");
    let skip = parse_index(query, "skip");

    let result = async {
        let records = store.find(&RecordFilter::all(), limit, skip).await?;
        let total = store.count(&RecordFilter::all()).await?;
        Ok::<_, crate::store::StoreError>((records, total))
    }
    .await;

    match result {
        Ok((records, total)) => ApiSuccess::new(json!({
            "data": records,
            "pagination": pagination(total, records.len(), limit, skip),
        }))
        .with_message(format!("{} retrieved successfully", resource.plural))
        .into_response(),
        Err(e) => ApiError::database(
            format!("Failed to retrieve {}", resource.plural.to_lowercase()),
            &e.to_string(),
            development,
        )
        .into_response(),
    }
}

async fn create_record<P>(
    store: &dyn RecordStore<P>,
    resource: ResourceName,
    body: &Bytes,
    development: bool,
) -> Response
where
    P: Serialize + DeserializeOwned + Send + Sync,
{
    // Validation already ran; a non-JSON body cannot reach this point.
    let parsed: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => {
            return ApiError::new(ErrorCode::InvalidInput, "Request body must be valid JSON")
                .into_response();
        }
    };

    let date = parsed
        .get("date")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let payload: P = match serde_json::from_value(parsed) {
        Ok(payload) => payload,
        Err(e) => {
            return ApiError::new(ErrorCode::InvalidInput, e.to_string()).into_response();
        }
    };

    match store.create(date, payload).await {
        Ok(record) => {
            debug!(id = %record.id, "Record created");
            ApiSuccess::created(json!({ "data": record }))
                .with_message(format!("{} created successfully", resource.singular))
                .into_response()
        }
        Err(e) => ApiError::database(
            format!("Failed to create {}", resource.singular.to_lowercase()),
            &e.to_string(),
            development,
        )
        .into_response(),
    }
}

/// Resolve the validated `YYYY-MM-DD` pair into the inclusive instant
/// range: start of the first day through the last millisecond of the last.
fn resolve_range(
    query: &HashMap<String, String>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let (Some(start_raw), Some(end_raw)) = (query.get("startDate"), query.get("endDate")) else {
        return Err(ApiError::validation(vec![
            FieldError::new("startDate", "Start date is required (YYYY-MM-DD)"),
            FieldError::new("endDate", "End date is required (YYYY-MM-DD)"),
        ]));
    };

    let parse = |raw: &str| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
    let (Some(start), Some(end)) = (parse(start_raw), parse(end_raw)) else {
        return Err(ApiError::validation(vec![FieldError::new(
            "date",
            "Invalid date format. Use YYYY-MM-DD",
        )]));
    };

    let start = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = end
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc();
    Ok((start, end))
}

async fn records_by_date_range<P>(
    store: &dyn RecordStore<P>,
    resource: ResourceName,
    query: &HashMap<String, String>,
    development: bool,
) -> Response
where
    P: Serialize + Send + Sync,
{
    let (start, end) = match resolve_range(query) {
        Ok(range) => range,
        Err(e) => return e.into_response(),
    };

    let limit = parse_index(query, "limit");
    let skip = parse_index(query, "skip");
    let filter = RecordFilter::date_between(start, end);

    let result = async {
        let records = store.find(&filter, limit, skip).await?;
        let total = store.count(&filter).await?;
        Ok::<_, crate::store::StoreError>((records, total))
    }
    .await;

    match result {
        Ok((records, total)) => ApiSuccess::new(json!({
            "data": records,
            "dateRange": {
                "startDate": start.to_rfc3339_opts(SecondsFormat::Millis, true),
                "endDate": end.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
            "pagination": pagination(total, records.len(), limit, skip),
        }))
        .with_message(format!(
            "Found {} {} in date range",
            records.len(),
            resource.plural.to_lowercase()
        ))
        .into_response(),
        Err(e) => ApiError::database(
            format!(
                "Failed to retrieve {} by date range",
                resource.plural.to_lowercase()
            ),
            &e.to_string(),
            development,
        )
        .into_response(),
    }
}

macro_rules! resource_handlers {
    ($list:ident, $create:ident, $range:ident, $store:ident, $name:ident) => {
        pub async fn $list(
            State(state): State<AppState>,
            Query(query): Query<HashMap<String, String>>,
        ) -> Response {
            list_records(
                state.stores.$store.as_ref(),
                $name,
                &query,
                state.config.development,
            )
            .await
        }

        pub async fn $create(State(state): State<AppState>, body: Bytes) -> Response {
            create_record(
                state.stores.$store.as_ref(),
                $name,
                &body,
                state.config.development,
            )
            .await
        }

        pub async fn $range(
            State(state): State<AppState>,
            Query(query): Query<HashMap<String, String>>,
        ) -> Response {
            records_by_date_range(
                state.stores.$store.as_ref(),
                $name,
                &query,
                state.config.development,
            )
            .await
        }
    };
}

resource_handlers!(list_diodes, create_diode, diodes_by_date_range, diodes, DIODES);
resource_handlers!(
    list_light_intensity,
    create_light_intensity,
    light_intensity_by_date_range,
    light_intensity,
    LIGHT_INTENSITY
);
resource_handlers!(
    list_temperatures,
    create_temperature,
    temperatures_by_date_range,
    temperatures,
    TEMPERATURES
);
resource_handlers!(
    list_water_levels,
    create_water_level,
    water_levels_by_date_range,
    water_levels,
    WATER_LEVELS
);
resource_handlers!(
    list_humidities,
    create_humidity,
    humidities_by_date_range,
    humidities,
    HUMIDITIES
);
