//! Durable key-value table seam.
//!
//! Rows are JSON objects carrying a string `id` field; `insert` with an
//! existing id overwrites. [`MemoryTable`] backs tests and demos,
//! [`SqliteTable`] is the durable implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("value is missing a string `id` field")]
    MissingId,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("stored value is not valid JSON: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait KeyValueTable: Send + Sync {
    /// Fetch the row with the given id, if any.
    async fn get(&self, id: &str) -> Result<Option<Value>, TableError>;

    /// Store `value`, keyed by its `id` field. Overwrites an existing row.
    async fn insert(&self, value: Value) -> Result<(), TableError>;
}

fn record_id(value: &Value) -> Result<String, TableError> {
    value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(TableError::MissingId)
}

/// Process-local table for tests and demos.
#[derive(Default)]
pub struct MemoryTable {
    rows: DashMap<String, Value>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl KeyValueTable for MemoryTable {
    async fn get(&self, id: &str) -> Result<Option<Value>, TableError> {
        Ok(self.rows.get(id).map(|row| row.clone()))
    }

    async fn insert(&self, value: Value) -> Result<(), TableError> {
        let id = record_id(&value)?;
        self.rows.insert(id, value);
        Ok(())
    }
}

/// SQLite-backed table: one `kv_record` table with JSON-encoded values.
pub struct SqliteTable {
    pool: SqlitePool,
}

impl SqliteTable {
    /// Open (or create) the database at `url` and ensure the schema exists.
    ///
    /// A single connection is used; `sqlite::memory:` databases are per
    /// connection, so a larger pool would see different contents.
    pub async fn connect(url: &str) -> Result<Self, TableError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| TableError::Storage(e.to_string()))?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, ensuring the schema exists.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, TableError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS kv_record (
                 id    TEXT PRIMARY KEY,
                 value TEXT NOT NULL
               )"#,
        )
        .execute(&pool)
        .await
        .map_err(|e| TableError::Storage(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueTable for SqliteTable {
    async fn get(&self, id: &str) -> Result<Option<Value>, TableError> {
        let row = sqlx::query("SELECT value FROM kv_record WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TableError::Storage(e.to_string()))?;

        match row {
            None => Ok(None),
            Some(row) => {
                let raw: String = row
                    .try_get("value")
                    .map_err(|e| TableError::Storage(e.to_string()))?;
                let value =
                    serde_json::from_str(&raw).map_err(|e| TableError::Corrupt(e.to_string()))?;
                Ok(Some(value))
            }
        }
    }

    async fn insert(&self, value: Value) -> Result<(), TableError> {
        let id = record_id(&value)?;
        let res = sqlx::query(
            r#"INSERT INTO kv_record (id, value) VALUES (?1, ?2)
               ON CONFLICT(id) DO UPDATE SET value = excluded.value"#,
        )
        .bind(&id)
        .bind(value.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| TableError::Storage(e.to_string()))?;
        tracing::debug!(%id, rows = res.rows_affected(), "table.insert");
        Ok(())
    }
}
