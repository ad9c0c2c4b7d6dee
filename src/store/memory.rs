//! In-memory record store double for tests.
//!
//! Mirrors the store contract closely enough to exercise handlers and
//! routes without a live MongoDB: skip-before-limit ordering, inclusive
//! date ranges, not-found sentinels, and an optional always-failing mode
//! to provoke DATABASE_ERROR paths.

use crate::domain::record::SensorRecord;
use crate::store::{RecordFilter, RecordStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct MemoryRecordStore<P> {
    records: Mutex<Vec<SensorRecord<P>>>,
    next_id: AtomicU64,
    failing: bool,
}

impl<P> Default for MemoryRecordStore<P> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            failing: false,
        }
    }
}

impl<P: Clone + Serialize> MemoryRecordStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with a database error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Seed a record directly, bypassing the create path.
    pub fn seed(&self, date: DateTime<Utc>, payload: P) -> SensorRecord<P> {
        let record = SensorRecord {
            id: self.assign_id(),
            payload,
            date,
        };
        self.records.lock().unwrap().push(record.clone());
        record
    }

    fn assign_id(&self) -> String {
        // 24 hex chars, shaped like a driver-assigned ObjectId.
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check_failing(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Database("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn matches(record: &SensorRecord<P>, filter: &RecordFilter) -> bool {
        if let Some(range) = filter.date_range() {
            if record.date < range.start || record.date > range.end {
                return false;
            }
        }
        if !filter.equals().is_empty() {
            let fields = serde_json::to_value(&record.payload).unwrap_or_default();
            for (field, expected) in filter.equals() {
                if fields.get(field) != Some(expected) {
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl<P> RecordStore<P> for MemoryRecordStore<P>
where
    P: Clone + Serialize + Send + Sync,
{
    async fn create(&self, date: DateTime<Utc>, payload: P) -> Result<SensorRecord<P>, StoreError> {
        self.check_failing()?;
        Ok(self.seed(date, payload))
    }

    async fn find(
        &self,
        filter: &RecordFilter,
        limit: Option<u64>,
        skip: Option<u64>,
    ) -> Result<Vec<SensorRecord<P>>, StoreError> {
        self.check_failing()?;
        let records = self.records.lock().unwrap();
        let matches = records
            .iter()
            .filter(|r| Self::matches(r, filter))
            .skip(skip.unwrap_or(0) as usize);
        let matches: Vec<_> = match limit {
            Some(limit) => matches.take(limit as usize).cloned().collect(),
            None => matches.cloned().collect(),
        };
        Ok(matches)
    }

    async fn find_one(&self, filter: &RecordFilter) -> Result<Option<SensorRecord<P>>, StoreError> {
        self.check_failing()?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| Self::matches(r, filter)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SensorRecord<P>>, StoreError> {
        self.check_failing()?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn count(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        self.check_failing()?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| Self::matches(r, filter)).count() as u64)
    }

    async fn update(&self, id: &str, payload: P) -> Result<Option<SensorRecord<P>>, StoreError> {
        self.check_failing()?;
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.payload = payload;
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_one(
        &self,
        filter: &RecordFilter,
        payload: P,
    ) -> Result<Option<SensorRecord<P>>, StoreError> {
        self.check_failing()?;
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| Self::matches(r, filter)) {
            Some(record) => {
                record.payload = payload;
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<Option<SensorRecord<P>>, StoreError> {
        self.check_failing()?;
        let mut records = self.records.lock().unwrap();
        match records.iter().position(|r| r.id == id) {
            Some(index) => Ok(Some(records.remove(index))),
            None => Ok(None),
        }
    }

    async fn delete_one(
        &self,
        filter: &RecordFilter,
    ) -> Result<Option<SensorRecord<P>>, StoreError> {
        self.check_failing()?;
        let mut records = self.records.lock().unwrap();
        match records.iter().position(|r| Self::matches(r, filter)) {
            Some(index) => Ok(Some(records.remove(index))),
            None => Ok(None),
        }
    }

    async fn exists(&self, filter: &RecordFilter) -> Result<bool, StoreError> {
        self.check_failing()?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().any(|r| Self::matches(r, filter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::MeasurementPayload;

    fn date(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_skip_applied_before_limit() {
        let store = MemoryRecordStore::new();
        for i in 0..5 {
            store.seed(
                date("2025-01-10T12:00:00Z"),
                MeasurementPayload { value: i as f64 },
            );
        }

        let records = store
            .find(&RecordFilter::all(), Some(2), Some(1))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload.value, 1.0);
        assert_eq!(records[1].payload.value, 2.0);
    }

    #[tokio::test]
    async fn test_date_range_boundaries_included() {
        let store = MemoryRecordStore::new();
        let start = date("2025-01-05T00:00:00Z");
        let end = date("2025-01-10T23:59:59.999Z");
        store.seed(start, MeasurementPayload { value: 1.0 });
        store.seed(end, MeasurementPayload { value: 2.0 });
        store.seed(
            date("2025-01-11T00:00:00Z"),
            MeasurementPayload { value: 3.0 },
        );

        let records = store
            .find(&RecordFilter::date_between(start, end), None, None)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            store
                .count(&RecordFilter::date_between(start, end))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let store: MemoryRecordStore<MeasurementPayload> = MemoryRecordStore::new();
        let records = store.find(&RecordFilter::all(), None, None).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(store.find_by_id("unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failing_store_reports_database_error() {
        let store: MemoryRecordStore<MeasurementPayload> = MemoryRecordStore::failing();
        let err = store.count(&RecordFilter::all()).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[tokio::test]
    async fn test_delete_returns_deleted_record() {
        let store = MemoryRecordStore::new();
        let record = store.seed(
            date("2025-01-10T12:00:00Z"),
            MeasurementPayload { value: 7.0 },
        );
        let deleted = store.delete(&record.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, record.id);
        assert_eq!(store.count(&RecordFilter::all()).await.unwrap(), 0);
    }
}
