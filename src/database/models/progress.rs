use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::datetime::now_timestamp;

/// One tracked plan, e.g. a `/studyplan` run, with the steps ticked off so far.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StudyProgress {
    pub id: String,
    pub user_id: i64,
    pub plan_type: String,
    pub level: String,
    pub completed_steps: String, // JSON array of step names
    pub created_at: String,
}

impl StudyProgress {
    pub async fn record(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        plan_type: &str,
        level: &str,
    ) -> Result<Self, sqlx::Error> {
        let progress = StudyProgress {
            id: Uuid::new_v4().to_string(),
            user_id,
            plan_type: plan_type.to_string(),
            level: level.to_string(),
            completed_steps: "[]".to_string(),
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO study_progress (id, user_id, plan_type, level, completed_steps, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&progress.id)
        .bind(progress.user_id)
        .bind(&progress.plan_type)
        .bind(&progress.level)
        .bind(&progress.completed_steps)
        .bind(&progress.created_at)
        .execute(pool)
        .await?;

        Ok(progress)
    }

    /// Newest first.
    pub async fn find_by_user(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        plan_type: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, StudyProgress>(
            r#"
            SELECT id, user_id, plan_type, level, completed_steps, created_at
            FROM study_progress
            WHERE user_id = ? AND plan_type = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .bind(plan_type)
        .fetch_all(pool)
        .await
    }

    /// Appends `step` to the user's newest plan of `plan_type`. Returns the
    /// updated row, or `None` when the user tracks no such plan. Completing a
    /// step twice records it once.
    pub async fn complete_step(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        plan_type: &str,
        step: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let latest = sqlx::query_as::<_, StudyProgress>(
            r#"
            SELECT id, user_id, plan_type, level, completed_steps, created_at
            FROM study_progress
            WHERE user_id = ? AND plan_type = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(plan_type)
        .fetch_optional(&mut tx)
        .await?;

        let Some(mut progress) = latest else {
            return Ok(None);
        };

        let mut steps = progress.steps();
        if !steps.iter().any(|s| s.eq_ignore_ascii_case(step)) {
            steps.push(step.to_string());
        }
        progress.completed_steps =
            serde_json::to_string(&steps).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

        sqlx::query("UPDATE study_progress SET completed_steps = ? WHERE id = ?")
            .bind(&progress.completed_steps)
            .bind(&progress.id)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;

        Ok(Some(progress))
    }

    pub fn steps(&self) -> Vec<String> {
        serde_json::from_str(&self.completed_steps).unwrap_or_default()
    }
}
