use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, types::Json, PgPool, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::store::{document_id, Collection, Document, DocumentStore, ID_FIELD};
use crate::filter::{Filter, FilterData};

/// Document store backed by one JSONB table per collection
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn filter(collection: Collection, filter_data: &FilterData) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(collection.table_name())?;
        filter.assign(filter_data)?;
        Ok(filter)
    }
}

fn into_document(value: Value) -> Result<Document, DatabaseError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::QueryError(format!("stored document is not an object: {}", other))),
    }
}

fn bind_params<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    params: &'q [Value],
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    // Every filter parameter is compared against a JSONB path, so bind as JSONB
    for p in params {
        q = q.bind(Json(p));
    }
    q
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, DatabaseError> {
        let id = document_id(&doc)?;
        let sql = format!(
            "INSERT INTO \"{}\" (id, doc) VALUES ($1, $2) RETURNING doc",
            collection.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(Json(Value::Object(doc)))
            .fetch_one(&self.pool)
            .await?;
        let Json(stored): Json<Value> = row.try_get("doc")?;
        into_document(stored)
    }

    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<Vec<Document>, DatabaseError> {
        let sql_result = Self::filter(collection, filter)?.to_sql()?;
        let rows = bind_params(sqlx::query(&sql_result.query), &sql_result.params)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let Json(doc): Json<Value> = row.try_get("doc")?;
                into_document(doc)
            })
            .collect()
    }

    async fn count(&self, collection: Collection, filter: &FilterData) -> Result<i64, DatabaseError> {
        let sql_result = Self::filter(collection, filter)?.to_count_sql()?;
        let row = bind_params(sqlx::query(&sql_result.query), &sql_result.params)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn update_one(&self, collection: Collection, id: Uuid, mut changes: Document) -> Result<Option<Document>, DatabaseError> {
        changes.remove(ID_FIELD);
        let sql = format!(
            "UPDATE \"{}\" SET doc = doc || $1 WHERE id = $2 RETURNING doc",
            collection.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(Json(Value::Object(changes)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let Json(doc): Json<Value> = row.try_get("doc")?;
                Ok(Some(into_document(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn update_many(&self, collection: Collection, filter: &FilterData, mut changes: Document) -> Result<u64, DatabaseError> {
        changes.remove(ID_FIELD);
        let sql_result = Self::filter(collection, filter)?.to_update_sql()?;
        let patch = Value::Object(changes);
        let mut q = sqlx::query(&sql_result.query).bind(Json(&patch));
        for p in &sql_result.params {
            q = q.bind(Json(p));
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, collection: Collection, id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", collection.table_name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, collection: Collection, filter: &FilterData) -> Result<u64, DatabaseError> {
        let sql_result = Self::filter(collection, filter)?.to_delete_sql()?;
        let result = bind_params(sqlx::query(&sql_result.query), &sql_result.params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
