use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;

use crate::database::{connection::DatabaseManager, models::*};
use crate::error::{with_timeout, BotError, BotResult};
use crate::services::matching::RideMatch;
use crate::utils::logging::{log_notification, NotificationOutcome};

/// Delivers plain text to a user's private chat.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, user_id: i64, text: &str) -> BotResult<()>;
}

/// `MessageSender` backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
    timeout: Duration,
}

impl TelegramSender {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send(&self, user_id: i64, text: &str) -> BotResult<()> {
        let request = self.bot.send_message(ChatId(user_id), text.to_string()).send();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BotError::Infrastructure(format!("telegram send to {user_id}: {e}"))),
            Err(_) => Err(BotError::Infrastructure(format!(
                "telegram send to {user_id} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

/// Tally of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Pushes ride alerts to matched users, at most once per (request, recipient).
pub struct NotificationDispatcher {
    db: DatabaseManager,
    sender: Arc<dyn MessageSender>,
    retry_delay: Duration,
    store_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(db: DatabaseManager, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            db,
            sender,
            retry_delay: Duration::from_secs(1),
            store_timeout: Duration::from_secs(10),
        }
    }

    /// Upper bound for each profile lookup and marker write.
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Notifies every matched counterpart of `request`. Store and delivery
    /// failures are logged and counted, never returned.
    pub async fn dispatch(&self, request: &RideRequest, matches: &[RideMatch]) -> DispatchReport {
        let mut report = DispatchReport::default();

        let requester = match with_timeout(
            self.store_timeout,
            "load requester profile",
            Profile::find(&self.db.pool, request.user_id),
        )
        .await
        {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!("Ride request {} has no requester profile, skipping dispatch", request.id);
                report.skipped = matches.len();
                return report;
            }
            Err(e) => {
                tracing::error!("Failed to load requester {} for dispatch: {}", request.user_id, e);
                report.failed = matches.len();
                return report;
            }
        };

        for ride_match in matches {
            match self.notify_one(&requester, request, ride_match).await {
                Ok(NotificationOutcome::Sent) => report.sent += 1,
                Ok(NotificationOutcome::Skipped) => report.skipped += 1,
                Ok(NotificationOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    tracing::error!(
                        "Notification bookkeeping failed for request {} -> {}: {}",
                        request.id, ride_match.user_id, e
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Dispatch for ride request {} finished: {} sent, {} skipped, {} failed",
            request.id, report.sent, report.skipped, report.failed
        );
        report
    }

    async fn notify_one(
        &self,
        requester: &Profile,
        request: &RideRequest,
        ride_match: &RideMatch,
    ) -> BotResult<NotificationOutcome> {
        let recipient_id = ride_match.user_id;

        if recipient_id == request.user_id {
            log_notification(&request.id, recipient_id, NotificationOutcome::Skipped, Some("requester"));
            return Ok(NotificationOutcome::Skipped);
        }

        // Opt-in is re-read here: the user may have opted out since matching ran
        let opted_in = with_timeout(
            self.store_timeout,
            "load recipient profile",
            Profile::find(&self.db.pool, recipient_id),
        )
        .await?
        .is_some_and(|p| p.ride_opt_in);
        if !opted_in {
            log_notification(&request.id, recipient_id, NotificationOutcome::Skipped, Some("not opted in"));
            return Ok(NotificationOutcome::Skipped);
        }

        let claimed = with_timeout(
            self.store_timeout,
            "claim notification marker",
            RideNotification::claim(&self.db.pool, &request.id, recipient_id),
        )
        .await?;
        if !claimed {
            log_notification(&request.id, recipient_id, NotificationOutcome::Skipped, Some("already notified"));
            return Ok(NotificationOutcome::Skipped);
        }

        let text = format_ride_alert(requester, request, ride_match);

        if let Err(first) = self.sender.send(recipient_id, &text).await {
            tracing::warn!("Ride alert to {} failed, retrying once: {}", recipient_id, first);
            tokio::time::sleep(self.retry_delay).await;

            if let Err(second) = self.sender.send(recipient_id, &text).await {
                with_timeout(
                    self.store_timeout,
                    "mark notification failed",
                    RideNotification::mark_failed(&self.db.pool, &request.id, recipient_id),
                )
                .await?;
                log_notification(
                    &request.id,
                    recipient_id,
                    NotificationOutcome::Failed,
                    Some(&second.to_string()),
                );
                return Ok(NotificationOutcome::Failed);
            }
        }

        log_notification(&request.id, recipient_id, NotificationOutcome::Sent, None);
        Ok(NotificationOutcome::Sent)
    }
}

fn format_ride_alert(requester: &Profile, request: &RideRequest, ride_match: &RideMatch) -> String {
    let contacts = requester.contacts_map();
    let contact_line = if contacts.is_empty() {
        format!("Reach out to {} on Telegram.", requester.display_name())
    } else {
        let list: Vec<String> = contacts
            .iter()
            .map(|(channel, handle)| format!("{channel}: {handle}"))
            .collect();
        format!("Contact: {}", list.join(", "))
    };

    format!(
        "🚗 Ride match!\n\n{} ({}) is going from {} to {} at {}.\nYour route: {} → {} at {}.\n\n{}",
        requester.display_name(),
        requester.department,
        request.from_location,
        request.to_location,
        request.ride_time,
        ride_match.from_location,
        ride_match.to_location,
        ride_match.ride_time,
        contact_line
    )
}
