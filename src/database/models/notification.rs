use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::datetime::now_timestamp;

/// Marker recording that a recipient was (or failed to be) told about a ride request.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RideNotification {
    pub request_id: String,
    pub recipient_id: i64,
    pub status: String, // 'sent' or 'failed'
    pub created_at: String,
}

impl RideNotification {
    /// Atomically claims the (request, recipient) pair. Returns false when
    /// another dispatch already claimed it.
    pub async fn claim(
        pool: &sqlx::SqlitePool,
        request_id: &str,
        recipient_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO ride_notifications (request_id, recipient_id, status, created_at)
            VALUES (?, ?, 'sent', ?)
            "#,
        )
        .bind(request_id)
        .bind(recipient_id)
        .bind(now_timestamp())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_failed(
        pool: &sqlx::SqlitePool,
        request_id: &str,
        recipient_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE ride_notifications SET status = 'failed' WHERE request_id = ? AND recipient_id = ?",
        )
        .bind(request_id)
        .bind(recipient_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_request(
        pool: &sqlx::SqlitePool,
        request_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RideNotification>(
            "SELECT request_id, recipient_id, status, created_at FROM ride_notifications WHERE request_id = ? ORDER BY recipient_id",
        )
        .bind(request_id)
        .fetch_all(pool)
        .await
    }
}
