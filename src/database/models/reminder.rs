use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::datetime::now_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "once" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            other => Err(format!("Unknown recurrence '{other}'. Use daily or weekly")),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: i64,
    pub task: String,
    pub deadline: String, // YYYY-MM-DD
    pub recurrence: String,
    pub last_sent: Option<String>, // YYYY-MM-DD
    pub created_at: String,
}

impl Reminder {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        task: String,
        deadline: NaiveDate,
        recurrence: Recurrence,
    ) -> Result<Self, sqlx::Error> {
        let reminder = Reminder {
            id: Uuid::new_v4().to_string(),
            user_id,
            task,
            deadline: deadline.format("%Y-%m-%d").to_string(),
            recurrence: recurrence.as_str().to_string(),
            last_sent: None,
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO reminders (id, user_id, task, deadline, recurrence, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&reminder.id)
        .bind(reminder.user_id)
        .bind(&reminder.task)
        .bind(&reminder.deadline)
        .bind(&reminder.recurrence)
        .bind(&reminder.created_at)
        .execute(pool)
        .await?;

        Ok(reminder)
    }

    pub async fn find_by_user(
        pool: &sqlx::SqlitePool,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Reminder>(
            "SELECT id, user_id, task, deadline, recurrence, last_sent, created_at FROM reminders WHERE user_id = ? ORDER BY deadline, created_at"
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Reminders that may still produce a delivery: recurring ones, and one-off
    /// ones that were never sent.
    pub async fn find_pending(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Reminder>(
            "SELECT id, user_id, task, deadline, recurrence, last_sent, created_at FROM reminders WHERE recurrence != 'none' OR last_sent IS NULL ORDER BY deadline"
        )
        .fetch_all(pool)
        .await
    }

    pub async fn mark_sent(
        pool: &sqlx::SqlitePool,
        reminder_id: &str,
        day: NaiveDate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE reminders SET last_sent = ? WHERE id = ?")
            .bind(day.format("%Y-%m-%d").to_string())
            .bind(reminder_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn delete_by_user(pool: &sqlx::SqlitePool, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reminders WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub fn recurrence(&self) -> Recurrence {
        self.recurrence.parse().unwrap_or(Recurrence::None)
    }

    /// Whether a delivery is owed on `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        let Ok(deadline) = NaiveDate::parse_from_str(&self.deadline, "%Y-%m-%d") else {
            return false;
        };

        if today < deadline {
            return false;
        }

        let today_str = today.format("%Y-%m-%d").to_string();
        if self.last_sent.as_deref() == Some(today_str.as_str()) {
            return false;
        }

        match self.recurrence() {
            Recurrence::None => self.last_sent.is_none(),
            Recurrence::Daily => true,
            Recurrence::Weekly => (today - deadline).num_days() % 7 == 0,
        }
    }
}
