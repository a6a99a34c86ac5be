use std::fmt;
use tracing::{error, info, warn};

/// Logs command start with consistent format
pub fn log_command_start(command: &str, user: &str, user_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_START: /{} by {}({}) - {}", command, user, user_id, d),
        None => info!("CMD_START: /{} by {}({})", command, user, user_id),
    }
}

/// Logs command completion with consistent format
pub fn log_command_success(command: &str, user: &str, user_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_SUCCESS: /{} by {}({}) - {}", command, user, user_id, d),
        None => info!("CMD_SUCCESS: /{} by {}({})", command, user, user_id),
    }
}

/// Logs command errors with consistent format
pub fn log_command_error(command: &str, user: &str, user_id: i64, error: &str) {
    error!("CMD_ERROR: /{} by {}({}) - {}", command, user, user_id, error);
}

/// Logs rejected arguments; these are the user's mistake, not ours
pub fn log_validation_error(command: &str, error: &str, user: &str, user_id: i64) {
    warn!(
        "VALIDATION_ERROR: /{} rejected for {}({}): {}",
        command, user, user_id, error
    );
}

/// Logs timeout events with consistent format
pub fn log_timeout(operation: &str, duration_secs: u64, details: Option<&str>) {
    match details {
        Some(d) => warn!("TIMEOUT: {} after {}s - {}", operation, duration_secs, d),
        None => warn!("TIMEOUT: {} after {}s", operation, duration_secs),
    }
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Skipped,
    Failed,
}

impl fmt::Display for NotificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationOutcome::Sent => "sent",
            NotificationOutcome::Skipped => "skipped",
            NotificationOutcome::Failed => "failed",
        })
    }
}

/// Logs one ride notification decision
pub fn log_notification(request_id: &str, recipient_id: i64, outcome: NotificationOutcome, reason: Option<&str>) {
    match (outcome, reason) {
        (NotificationOutcome::Failed, Some(r)) => error!(
            "NOTIFY: request {} -> {} {} - {}",
            request_id, recipient_id, outcome, r
        ),
        (_, Some(r)) => info!("NOTIFY: request {} -> {} {} ({})", request_id, recipient_id, outcome, r),
        (_, None) => info!("NOTIFY: request {} -> {} {}", request_id, recipient_id, outcome),
    }
}
