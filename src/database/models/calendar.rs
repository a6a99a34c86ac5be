use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub event_date: String, // YYYY-MM-DD
    #[serde(default)]
    pub details: String,
}

impl CalendarEvent {
    pub async fn insert(
        pool: &sqlx::SqlitePool,
        name: &str,
        event_date: NaiveDate,
        details: &str,
    ) -> Result<Self, sqlx::Error> {
        let event_date = event_date.format("%Y-%m-%d").to_string();

        let result = sqlx::query(
            "INSERT INTO calendar_events (name, event_date, details) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(&event_date)
        .bind(details)
        .execute(pool)
        .await?;

        Ok(CalendarEvent {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            event_date,
            details: details.to_string(),
        })
    }

    pub async fn find_upcoming(
        pool: &sqlx::SqlitePool,
        from: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CalendarEvent>(
            "SELECT id, name, event_date, details FROM calendar_events WHERE event_date >= ? ORDER BY event_date, id LIMIT ?",
        )
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
