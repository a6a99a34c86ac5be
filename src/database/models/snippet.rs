use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::datetime::now_timestamp;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub id: String,
    pub user_id: i64,
    pub description: String,
    pub tags: String, // comma-joined, lowercase
    pub snippet: String,
    pub created_at: String,
}

impl CodeSnippet {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        description: String,
        tags: &[String],
        snippet: String,
    ) -> Result<Self, sqlx::Error> {
        let record = CodeSnippet {
            id: Uuid::new_v4().to_string(),
            user_id,
            description,
            tags: tags.join(","),
            snippet,
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO code_snippets (id, user_id, description, tags, snippet, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&record.id)
        .bind(record.user_id)
        .bind(&record.description)
        .bind(&record.tags)
        .bind(&record.snippet)
        .bind(&record.created_at)
        .execute(pool)
        .await?;

        Ok(record)
    }

    /// The user's most recent snippets, optionally only those carrying `tag`
    /// exactly (not as a substring of a longer tag).
    pub async fn find_by_user(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        tag: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match tag {
            Some(tag) => {
                sqlx::query_as::<_, CodeSnippet>(
                    r#"
                    SELECT id, user_id, description, tags, snippet, created_at
                    FROM code_snippets
                    WHERE user_id = ? AND (',' || tags || ',') LIKE ?
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(user_id)
                .bind(format!("%,{tag},%"))
                .bind(limit)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, CodeSnippet>(
                    r#"
                    SELECT id, user_id, description, tags, snippet, created_at
                    FROM code_snippets
                    WHERE user_id = ?
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn count_by_user(pool: &sqlx::SqlitePool, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM code_snippets WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(',').filter(|t| !t.is_empty()).collect()
    }
}
