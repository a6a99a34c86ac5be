use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::datetime::{now_timestamp, to_db_timestamp};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: String,
    pub user_id: i64,
    pub from_location: String,
    pub to_location: String,
    pub ride_time: String, // HH:MM
    pub created_at: String,
}

impl RideRequest {
    /// Stores the user's active request. Sharing the same route again keeps
    /// the request id (and with it the notification markers) and only
    /// refreshes `created_at`. A different route replaces the request under
    /// a fresh id, dropping the old markers.
    pub async fn upsert(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        from_location: &str,
        to_location: &str,
        ride_time: &str,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_as::<_, RideRequest>(
            "SELECT id, user_id, from_location, to_location, ride_time, created_at FROM ride_requests WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&mut tx)
        .await?;

        let request = RideRequest {
            id: Uuid::new_v4().to_string(),
            user_id,
            from_location: from_location.to_string(),
            to_location: to_location.to_string(),
            ride_time: ride_time.to_string(),
            created_at: now_timestamp(),
        };

        let request = match existing {
            Some(current) if current.same_route(&request) => {
                sqlx::query(
                    "UPDATE ride_requests SET from_location = ?, to_location = ?, created_at = ? WHERE id = ?",
                )
                .bind(&request.from_location)
                .bind(&request.to_location)
                .bind(&request.created_at)
                .bind(&current.id)
                .execute(&mut tx)
                .await?;

                RideRequest {
                    id: current.id,
                    ..request
                }
            }
            _ => {
                sqlx::query("DELETE FROM ride_requests WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&mut tx)
                    .await?;

                sqlx::query(
                    r#"
                    INSERT INTO ride_requests (id, user_id, from_location, to_location, ride_time, created_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&request.id)
                .bind(request.user_id)
                .bind(&request.from_location)
                .bind(&request.to_location)
                .bind(&request.ride_time)
                .bind(&request.created_at)
                .execute(&mut tx)
                .await?;

                request
            }
        };

        tx.commit().await?;

        Ok(request)
    }

    /// Same from/to (case-insensitive) and departure time.
    pub fn same_route(&self, other: &RideRequest) -> bool {
        self.from_location.to_lowercase() == other.from_location.to_lowercase()
            && self.to_location.to_lowercase() == other.to_location.to_lowercase()
            && self.ride_time == other.ride_time
    }

    pub async fn find_by_user(
        pool: &sqlx::SqlitePool,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RideRequest>(
            "SELECT id, user_id, from_location, to_location, ride_time, created_at FROM ride_requests WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count_by_user(pool: &sqlx::SqlitePool, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ride_requests WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Active requests of opted-in users other than `exclude_user_id`.
    pub async fn find_opted_in_excluding(
        pool: &sqlx::SqlitePool,
        exclude_user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RideRequest>(
            r#"
            SELECT r.id, r.user_id, r.from_location, r.to_location, r.ride_time, r.created_at
            FROM ride_requests r
            JOIN profiles p ON p.user_id = r.user_id
            WHERE p.ride_opt_in = TRUE AND r.user_id != ?
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(exclude_user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete_by_user(pool: &sqlx::SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ride_requests WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_created_before(
        pool: &sqlx::SqlitePool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ride_requests WHERE created_at < ?")
            .bind(to_db_timestamp(&cutoff))
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
