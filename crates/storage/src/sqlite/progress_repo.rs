use chrono::Utc;
use quiz_core::model::ProgressSnapshot;
use sqlx::Row;

use super::{SqliteRepository, mapping::ser};
use crate::repository::{ProgressStore, StorageError};

// The snapshot lives in a single well-known slot (id = 1): an absent row
// means no in-flight session.
#[async_trait::async_trait]
impl ProgressStore for SqliteRepository {
    async fn load(&self) -> Result<Option<ProgressSnapshot>, StorageError> {
        let row = sqlx::query("SELECT payload FROM session_progress WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(ser)?;

        match serde_json::from_str(&payload) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                tracing::warn!("discarding unreadable progress snapshot: {err}");
                Ok(None)
            }
        }
    }

    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        sqlx::query(
            r"
                INSERT INTO session_progress (id, payload, updated_at)
                VALUES (1, ?1, ?2)
                ON CONFLICT(id) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_progress WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
