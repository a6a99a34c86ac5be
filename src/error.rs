use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::services::fuzzy::FuzzyError;

/// Failures surfaced by the matching engine and the command layer.
#[derive(Error, Debug)]
pub enum BotError {
    /// Malformed command arguments.
    #[error("{0}")]
    Validation(String),

    /// Nothing scored above the match threshold.
    #[error("{0}")]
    NotFound(String),

    /// Store or delivery unavailable, or timed out.
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),

    /// The per-user cooldown for a command has not elapsed.
    #[error("/{command} is on cooldown for another {remaining_secs}s")]
    RateLimited { command: String, remaining_secs: u64 },
}

pub type BotResult<T> = Result<T, BotError>;

impl BotError {
    pub fn validation(message: impl Into<String>) -> Self {
        BotError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        BotError::NotFound(message.into())
    }

    /// Text shown to the user. Infrastructure details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            BotError::Validation(msg) | BotError::NotFound(msg) => msg.clone(),
            BotError::Infrastructure(_) => {
                "Something went wrong on our side. Please try again later.".to_string()
            }
            BotError::RateLimited { command, remaining_secs } => format!(
                "Please wait {remaining_secs} more second(s) before using /{command} again."
            ),
        }
    }

    pub fn is_infrastructure(&self) -> bool {
        matches!(self, BotError::Infrastructure(_))
    }
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Infrastructure(format!("database: {err}"))
    }
}

impl From<FuzzyError> for BotError {
    fn from(err: FuzzyError) -> Self {
        BotError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Infrastructure(format!("serialization: {err}"))
    }
}

/// Runs a store operation with an upper bound on how long it may take.
pub async fn with_timeout<T, E, F>(limit: Duration, operation: &str, fut: F) -> BotResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BotError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            crate::utils::logging::log_timeout(operation, limit.as_secs(), None);
            Err(BotError::Infrastructure(format!(
                "{operation} timed out after {}s",
                limit.as_secs()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_infrastructure_details() {
        let err = BotError::Infrastructure("database: pool timed out".to_string());
        assert!(!err.user_message().contains("pool"));
        assert!(err.user_message().contains("try again later"));
    }

    #[test]
    fn test_rate_limited_message_reports_remaining_time() {
        let err = BotError::RateLimited {
            command: "calendar".to_string(),
            remaining_secs: 12,
        };
        assert!(err.user_message().contains("12"));
        assert!(err.user_message().contains("/calendar"));
    }

    #[tokio::test]
    async fn test_with_timeout_maps_elapsed_to_infrastructure() {
        let result: BotResult<()> = with_timeout(
            Duration::from_millis(10),
            "slow query",
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<(), BotError>(())
            },
        )
        .await;

        assert!(matches!(result, Err(BotError::Infrastructure(_))));
    }
}
