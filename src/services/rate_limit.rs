use chrono::Utc;
use std::time::Duration;

use crate::database::{connection::DatabaseManager, models::CommandCooldown};
use crate::error::{with_timeout, BotError, BotResult};

/// Per-user cooldown for commands that hit slow or external sources.
#[derive(Clone)]
pub struct RateLimiter {
    db: DatabaseManager,
    cooldown_secs: u64,
    store_timeout: Duration,
}

impl RateLimiter {
    pub fn new(db: DatabaseManager, cooldown_secs: u64, store_timeout: Duration) -> Self {
        Self {
            db,
            cooldown_secs,
            store_timeout,
        }
    }

    pub async fn check(&self, user_id: i64, command: &str) -> BotResult<()> {
        self.check_at(user_id, command, Utc::now().timestamp()).await
    }

    /// Records a use at `now` (unix seconds) or fails with the time left.
    pub async fn check_at(&self, user_id: i64, command: &str, now: i64) -> BotResult<()> {
        if self.cooldown_secs == 0 {
            return Ok(());
        }

        let remaining = with_timeout(
            self.store_timeout,
            "command cooldown",
            CommandCooldown::try_acquire(&self.db.pool, user_id, command, self.cooldown_secs as i64, now),
        )
        .await?;

        match remaining {
            None => Ok(()),
            Some(remaining_secs) => {
                tracing::debug!(
                    "User {} hit the /{} cooldown, {}s remaining",
                    user_id, command, remaining_secs
                );
                Err(BotError::RateLimited {
                    command: command.to_string(),
                    remaining_secs,
                })
            }
        }
    }
}
