use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{document_id, Collection, Document, DocumentStore, ID_FIELD};
use crate::filter::filter_match::matches;
use crate::filter::filter_where::FilterWhere;
use crate::filter::{Condition, FilterData};

/// In-process document store. Collections keep insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn condition(filter: &FilterData) -> Result<Condition, DatabaseError> {
        match &filter.where_clause {
            Some(where_data) => Ok(FilterWhere::parse(where_data)?),
            None => Ok(Condition::And(vec![])),
        }
    }
}

fn merge(doc: &mut Document, changes: &Document) {
    for (key, value) in changes {
        if key != ID_FIELD {
            doc.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, DatabaseError> {
        let id = document_id(&doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| document_id(d).ok() == Some(id)) {
            return Err(DatabaseError::QueryError(format!("duplicate _id {} in {}", id, collection)));
        }
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<Vec<Document>, DatabaseError> {
        let condition = Self::condition(filter)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| matches(&condition, d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, collection: Collection, filter: &FilterData) -> Result<i64, DatabaseError> {
        let condition = Self::condition(filter)?;
        let collections = self.collections.read().await;
        let count = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| matches(&condition, d)).count())
            .unwrap_or(0);
        Ok(count as i64)
    }

    async fn update_one(&self, collection: Collection, id: Uuid, changes: Document) -> Result<Option<Document>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        match docs.iter_mut().find(|d| document_id(d).ok() == Some(id)) {
            Some(doc) => {
                merge(doc, &changes);
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_many(&self, collection: Collection, filter: &FilterData, changes: Document) -> Result<u64, DatabaseError> {
        let condition = Self::condition(filter)?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        let mut updated = 0;
        for doc in docs.iter_mut().filter(|d| matches(&condition, d)) {
            merge(doc, &changes);
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_one(&self, collection: Collection, id: Uuid) -> Result<bool, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| document_id(d).ok() != Some(id));
        Ok(docs.len() < before)
    }

    async fn delete_many(&self, collection: Collection, filter: &FilterData) -> Result<u64, DatabaseError> {
        let condition = Self::condition(filter)?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !matches(&condition, d));
        Ok((before - docs.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_find_update_delete() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .insert(Collection::Students, doc(json!({ "_id": id, "email": "ana@x.com", "roll": 1 })))
            .await
            .unwrap();

        let found = store.find(Collection::Students, &FilterData::eq("email", "ana@x.com")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(store.count(Collection::Teachers, &FilterData::all()).await.unwrap(), 0);

        let updated = store
            .update_one(Collection::Students, id, doc(json!({ "_id": "ignored", "roll": 2 })))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["roll"], 2);
        assert_eq!(updated["_id"], json!(id));

        assert!(store.delete_one(Collection::Students, id).await.unwrap());
        assert!(!store.delete_one(Collection::Students, id).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_documents_without_id() {
        let store = MemoryStore::new();
        let err = store.insert(Collection::Users, doc(json!({ "email": "x" }))).await.unwrap_err();
        assert!(matches!(err, DatabaseError::QueryError(_)));
    }

    #[tokio::test]
    async fn update_and_delete_many_by_filter() {
        let store = MemoryStore::new();
        for email in ["a@x.com", "b@x.com", "a@x.com"] {
            store
                .insert(Collection::Messages, doc(json!({ "_id": Uuid::new_v4(), "senderEmail": email })))
                .await
                .unwrap();
        }
        let filter = FilterData::eq("senderEmail", "a@x.com");
        assert_eq!(store.update_many(Collection::Messages, &filter, doc(json!({ "seen": true }))).await.unwrap(), 2);
        assert_eq!(store.count(Collection::Messages, &FilterData::eq("seen", true)).await.unwrap(), 2);
        assert_eq!(store.delete_many(Collection::Messages, &filter).await.unwrap(), 2);
        assert_eq!(store.count(Collection::Messages, &FilterData::all()).await.unwrap(), 1);
    }
}
