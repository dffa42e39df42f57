use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{Collection, Document, DocumentStore, ID_FIELD};
use crate::filter::FilterData;

/// Typed access to one collection of a `DocumentStore`
pub struct Repository<T> {
    collection: Collection,
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection,
            store: Arc::clone(&self.store),
            _phantom: PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(collection: Collection, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection,
            store,
            _phantom: PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        let docs = self.store.find(self.collection, &filter_data).await?;
        docs.into_iter().map(Self::decode).collect()
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        let docs = self.store.find(self.collection, &filter_data).await?;
        docs.into_iter().next().map(Self::decode).transpose()
    }

    pub async fn select_404(&self, filter_data: FilterData) -> Result<T, DatabaseError> {
        self.select_one(filter_data)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Record not found in {}", self.collection)))
    }

    pub async fn select_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.select_one(FilterData::eq(ID_FIELD, json!(id))).await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        self.store.count(self.collection, &filter_data).await
    }

    pub async fn insert(&self, record: &T) -> Result<T, DatabaseError> {
        let doc = Self::encode(record)?;
        let stored = self.store.insert(self.collection, doc).await?;
        Self::decode(stored)
    }

    /// Merge `changes` into the record; `None` when the id is unknown
    pub async fn update_id(&self, id: Uuid, changes: Document) -> Result<Option<T>, DatabaseError> {
        self.store
            .update_one(self.collection, id, changes)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn update_where(&self, filter_data: FilterData, changes: Document) -> Result<u64, DatabaseError> {
        self.store.update_many(self.collection, &filter_data, changes).await
    }

    pub async fn delete_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.store.delete_one(self.collection, id).await
    }

    pub async fn delete_where(&self, filter_data: FilterData) -> Result<u64, DatabaseError> {
        self.store.delete_many(self.collection, &filter_data).await
    }

    fn encode(record: &T) -> Result<Document, DatabaseError> {
        match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map),
            _ => Err(DatabaseError::QueryError(format!(
                "records in {} must serialize to JSON objects",
                Self::type_name()
            ))),
        }
    }

    fn decode(doc: Document) -> Result<T, DatabaseError> {
        Ok(serde_json::from_value(Value::Object(doc))?)
    }

    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }
}
