use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{ProgressRecordRepository, StorageError, StorageKey};

use super::SqliteRepository;

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProgressRecordRepository for SqliteRepository {
    async fn load_record(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload
            FROM progress_records
            WHERE storage_key = ?1
            ",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row
            .try_get("payload")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(payload))
    }

    async fn save_record(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress_records (storage_key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(storage_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.as_str())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_record(&self, key: &StorageKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM progress_records WHERE storage_key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
