//! Record store abstraction.
//!
//! One generic interface over a named collection of sensor records,
//! parameterized by the payload shape. The MongoDB implementation lives in
//! [`mongo`]; the five typed bindings in [`collections`]. Handlers only
//! ever see `dyn RecordStore<P>`, so tests can substitute an in-memory
//! double.

pub mod collections;
#[cfg(test)]
pub mod memory;
pub mod mongo;

pub use collections::SensorStores;
pub use mongo::{connect, MongoRecordStore};

use crate::domain::record::SensorRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage-layer failure. Every operation is a single attempt; a failed
/// call is surfaced verbatim, never retried here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The underlying driver reported a failure.
    #[error("database error: {0}")]
    Database(String),
}

/// Inclusive date range, both endpoints included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Structural record predicate: field equality plus an optional two-sided
/// range on `date`. Converted to a driver query inside the store
/// implementation; nothing above the store sees the wire format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    equals: Vec<(String, serde_json::Value)>,
    date_range: Option<DateRange>,
}

impl RecordFilter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches records whose `date` lies in `[start, end]`.
    pub fn date_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            equals: Vec::new(),
            date_range: Some(DateRange { start, end }),
        }
    }

    /// Add an equality constraint on a named field.
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn equals(&self) -> &[(String, serde_json::Value)] {
        &self.equals
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }
}

/// Generic CRUD over one collection of records with payload `P`.
///
/// `update*` and `delete*` are not routed on the current HTTP surface but
/// belong to the abstraction for future resources. All operations may fail
/// with [`StoreError::Database`]; "nothing matched" is a sentinel
/// (`None` / empty vec / `false`), never an error.
#[async_trait]
pub trait RecordStore<P>: Send + Sync {
    /// Store a record; the identifier is assigned by the store.
    async fn create(&self, date: DateTime<Utc>, payload: P) -> Result<SensorRecord<P>, StoreError>;

    /// Ordered sequence of matches. `skip` elides the first N matches and
    /// is applied before `limit` caps the result length.
    async fn find(
        &self,
        filter: &RecordFilter,
        limit: Option<u64>,
        skip: Option<u64>,
    ) -> Result<Vec<SensorRecord<P>>, StoreError>;

    /// First match, if any.
    async fn find_one(&self, filter: &RecordFilter) -> Result<Option<SensorRecord<P>>, StoreError>;

    /// Lookup by identifier. An id that can never have been assigned by
    /// the store resolves to `None`.
    async fn find_by_id(&self, id: &str) -> Result<Option<SensorRecord<P>>, StoreError>;

    /// Number of matches.
    async fn count(&self, filter: &RecordFilter) -> Result<u64, StoreError>;

    /// Replace the payload of the record with this id, returning the
    /// updated record.
    async fn update(&self, id: &str, payload: P) -> Result<Option<SensorRecord<P>>, StoreError>;

    /// Replace the payload of the first match, returning the updated
    /// record.
    async fn update_one(
        &self,
        filter: &RecordFilter,
        payload: P,
    ) -> Result<Option<SensorRecord<P>>, StoreError>;

    /// Delete by identifier, returning the deleted record.
    async fn delete(&self, id: &str) -> Result<Option<SensorRecord<P>>, StoreError>;

    /// Delete the first match, returning the deleted record.
    async fn delete_one(&self, filter: &RecordFilter)
        -> Result<Option<SensorRecord<P>>, StoreError>;

    /// Existence probe; must not fetch record bodies.
    async fn exists(&self, filter: &RecordFilter) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_filter_is_empty() {
        let filter = RecordFilter::all();
        assert!(filter.equals().is_empty());
        assert!(filter.date_range().is_none());
    }

    #[test]
    fn test_date_between_is_inclusive_range() {
        let start = "2025-01-05T00:00:00Z".parse().unwrap();
        let end = "2025-01-10T23:59:59.999Z".parse().unwrap();
        let filter = RecordFilter::date_between(start, end);
        let range = filter.date_range().unwrap();
        assert_eq!(range.start, start);
        assert_eq!(range.end, end);
    }

    #[test]
    fn test_field_eq_accumulates() {
        let filter = RecordFilter::all()
            .field_eq("status", true)
            .field_eq("value", 42.0);
        assert_eq!(filter.equals().len(), 2);
        assert_eq!(filter.equals()[0].0, "status");
    }
}
