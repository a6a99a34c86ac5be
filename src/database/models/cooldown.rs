use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CommandCooldown {
    pub user_id: i64,
    pub command: String,
    pub last_used: i64, // unix seconds
}

impl CommandCooldown {
    /// Records a use of `command` at `now` unless the previous use is less than
    /// `cooldown_secs` old. Returns the seconds still to wait when refused.
    pub async fn try_acquire(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        command: &str,
        cooldown_secs: i64,
        now: i64,
    ) -> Result<Option<u64>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO command_cooldowns (user_id, command, last_used)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, command) DO UPDATE SET last_used = excluded.last_used
            WHERE command_cooldowns.last_used <= ?
            "#,
        )
        .bind(user_id)
        .bind(command)
        .bind(now)
        .bind(now - cooldown_secs)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(None);
        }

        let last_used = sqlx::query_scalar::<_, i64>(
            "SELECT last_used FROM command_cooldowns WHERE user_id = ? AND command = ?",
        )
        .bind(user_id)
        .bind(command)
        .fetch_one(pool)
        .await?;

        let remaining = (last_used + cooldown_secs - now).max(1);
        Ok(Some(remaining as u64))
    }
}
