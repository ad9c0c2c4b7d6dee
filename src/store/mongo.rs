//! MongoDB-backed record store.
//!
//! Wire representation (`SensorDocument`) and conversion to the domain
//! record live here; nothing above this module sees BSON. Every driver
//! failure is wrapped as [`StoreError::Database`] with the driver text.

use crate::domain::record::SensorRecord;
use crate::store::{RecordFilter, RecordStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Connect to the document store and verify the connection with a ping.
///
/// This is a boot-time hard dependency: callers are expected to exit the
/// process when it fails, not to retry per request.
pub async fn connect(uri: &str, db_name: &str) -> Result<Database, StoreError> {
    let client = Client::with_uri_str(uri)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
    let db = client.database(db_name);
    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
    info!(db = db_name, "MongoDB connected");
    Ok(db)
}

/// Stored shape of one record: driver id, flattened payload, BSON date.
#[derive(Debug, Serialize, Deserialize)]
struct SensorDocument<P> {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(flatten)]
    payload: P,
    date: BsonDateTime,
}

impl<P> SensorDocument<P> {
    fn into_record(self) -> SensorRecord<P> {
        SensorRecord {
            id: self.id.to_hex(),
            payload: self.payload,
            date: bson_to_chrono(self.date),
        }
    }
}

fn chrono_to_bson(date: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(date.timestamp_millis())
}

fn bson_to_chrono(date: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(date.timestamp_millis()).unwrap_or(DateTime::UNIX_EPOCH)
}

fn database_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Translate a [`RecordFilter`] into a driver query document.
fn filter_document(filter: &RecordFilter) -> Result<Document, StoreError> {
    let mut document = Document::new();
    for (field, value) in filter.equals() {
        let value = bson::to_bson(value).map_err(database_error)?;
        document.insert(field.clone(), value);
    }
    if let Some(range) = filter.date_range() {
        document.insert(
            "date",
            doc! {
                "$gte": chrono_to_bson(range.start),
                "$lte": chrono_to_bson(range.end),
            },
        );
    }
    Ok(document)
}

/// One collection of records with payload `P`.
pub struct MongoRecordStore<P: Send + Sync> {
    collection: Collection<SensorDocument<P>>,
}

impl<P> MongoRecordStore<P>
where
    P: Serialize + DeserializeOwned + Send + Sync,
{
    /// Bind the store to a named collection.
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }

    fn id_query(id: &str) -> Option<Document> {
        // A string that is not a valid ObjectId can never have been
        // assigned by this store, so the caller gets the not-found
        // sentinel rather than an error.
        let oid = ObjectId::parse_str(id).ok()?;
        Some(doc! { "_id": oid })
    }

    fn set_update(payload: &P) -> Result<Document, StoreError> {
        let fields = bson::to_document(payload).map_err(database_error)?;
        Ok(doc! { "$set": fields })
    }
}

#[async_trait]
impl<P> RecordStore<P> for MongoRecordStore<P>
where
    P: Serialize + DeserializeOwned + Send + Sync,
{
    async fn create(&self, date: DateTime<Utc>, payload: P) -> Result<SensorRecord<P>, StoreError> {
        let document = SensorDocument {
            id: ObjectId::new(),
            payload,
            date: chrono_to_bson(date),
        };
        self.collection
            .insert_one(&document)
            .await
            .map_err(database_error)?;
        Ok(document.into_record())
    }

    async fn find(
        &self,
        filter: &RecordFilter,
        limit: Option<u64>,
        skip: Option<u64>,
    ) -> Result<Vec<SensorRecord<P>>, StoreError> {
        let mut query = self.collection.find(filter_document(filter)?);
        if let Some(skip) = skip {
            query = query.skip(skip);
        }
        if let Some(limit) = limit {
            query = query.limit(limit as i64);
        }
        let documents: Vec<SensorDocument<P>> = query
            .await
            .map_err(database_error)?
            .try_collect()
            .await
            .map_err(database_error)?;
        Ok(documents
            .into_iter()
            .map(SensorDocument::into_record)
            .collect())
    }

    async fn find_one(&self, filter: &RecordFilter) -> Result<Option<SensorRecord<P>>, StoreError> {
        let document = self
            .collection
            .find_one(filter_document(filter)?)
            .await
            .map_err(database_error)?;
        Ok(document.map(SensorDocument::into_record))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SensorRecord<P>>, StoreError> {
        let Some(query) = Self::id_query(id) else {
            return Ok(None);
        };
        let document = self
            .collection
            .find_one(query)
            .await
            .map_err(database_error)?;
        Ok(document.map(SensorDocument::into_record))
    }

    async fn count(&self, filter: &RecordFilter) -> Result<u64, StoreError> {
        self.collection
            .count_documents(filter_document(filter)?)
            .await
            .map_err(database_error)
    }

    async fn update(&self, id: &str, payload: P) -> Result<Option<SensorRecord<P>>, StoreError> {
        let Some(query) = Self::id_query(id) else {
            return Ok(None);
        };
        let document = self
            .collection
            .find_one_and_update(query, Self::set_update(&payload)?)
            .return_document(ReturnDocument::After)
            .await
            .map_err(database_error)?;
        Ok(document.map(SensorDocument::into_record))
    }

    async fn update_one(
        &self,
        filter: &RecordFilter,
        payload: P,
    ) -> Result<Option<SensorRecord<P>>, StoreError> {
        let document = self
            .collection
            .find_one_and_update(filter_document(filter)?, Self::set_update(&payload)?)
            .return_document(ReturnDocument::After)
            .await
            .map_err(database_error)?;
        Ok(document.map(SensorDocument::into_record))
    }

    async fn delete(&self, id: &str) -> Result<Option<SensorRecord<P>>, StoreError> {
        let Some(query) = Self::id_query(id) else {
            return Ok(None);
        };
        let document = self
            .collection
            .find_one_and_delete(query)
            .await
            .map_err(database_error)?;
        Ok(document.map(SensorDocument::into_record))
    }

    async fn delete_one(
        &self,
        filter: &RecordFilter,
    ) -> Result<Option<SensorRecord<P>>, StoreError> {
        let document = self
            .collection
            .find_one_and_delete(filter_document(filter)?)
            .await
            .map_err(database_error)?;
        Ok(document.map(SensorDocument::into_record))
    }

    async fn exists(&self, filter: &RecordFilter) -> Result<bool, StoreError> {
        // Existence probe only: project the id, never record bodies.
        let probe = self
            .collection
            .clone_with_type::<Document>()
            .find_one(filter_document(filter)?)
            .projection(doc! { "_id": 1 })
            .await
            .map_err(database_error)?;
        Ok(probe.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::DiodePayload;

    #[test]
    fn test_empty_filter_matches_all() {
        let document = filter_document(&RecordFilter::all()).unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn test_date_range_filter_document() {
        let start: DateTime<Utc> = "2025-01-05T00:00:00Z".parse().unwrap();
        let end: DateTime<Utc> = "2025-01-10T23:59:59.999Z".parse().unwrap();
        let document = filter_document(&RecordFilter::date_between(start, end)).unwrap();

        let range = document.get_document("date").unwrap();
        assert_eq!(
            range.get_datetime("$gte").unwrap().timestamp_millis(),
            start.timestamp_millis()
        );
        assert_eq!(
            range.get_datetime("$lte").unwrap().timestamp_millis(),
            end.timestamp_millis()
        );
    }

    #[test]
    fn test_equality_filter_document() {
        let document = filter_document(&RecordFilter::all().field_eq("status", true)).unwrap();
        assert_eq!(document.get_bool("status").unwrap(), true);
    }

    #[test]
    fn test_document_into_record() {
        let oid = ObjectId::new();
        let date: DateTime<Utc> = "2025-01-10T12:00:00Z".parse().unwrap();
        let document = SensorDocument {
            id: oid,
            payload: DiodePayload { status: true },
            date: chrono_to_bson(date),
        };
        let record = document.into_record();
        assert_eq!(record.id, oid.to_hex());
        assert_eq!(record.date, date);
        assert!(record.payload.status);
    }

    #[test]
    fn test_unparseable_id_is_not_a_query() {
        assert!(MongoRecordStore::<DiodePayload>::id_query("not-an-object-id").is_none());
        assert!(
            MongoRecordStore::<DiodePayload>::id_query("64b5f0c2a1b2c3d4e5f60718").is_some()
        );
    }
}
