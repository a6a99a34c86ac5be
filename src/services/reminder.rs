use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::{connection::DatabaseManager, models::*};
use crate::services::notification::MessageSender;
use crate::utils::datetime::format_date;

pub struct ReminderService {
    sender: Arc<dyn MessageSender>,
    db: Arc<DatabaseManager>,
    scheduler: JobScheduler,
}

impl ReminderService {
    pub async fn new(
        sender: Arc<dyn MessageSender>,
        db: Arc<DatabaseManager>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            sender,
            db,
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Check at the top of every hour so a failed delivery gets another go the same day
        let sender = self.sender.clone();
        let db = self.db.clone();

        let reminder_job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let sender = sender.clone();
            let db = db.clone();
            Box::pin(async move {
                let today = Utc::now().date_naive();
                if let Err(e) = send_due_reminders(sender.as_ref(), &db, today).await {
                    tracing::error!("Failed to send reminders: {}", e);
                }
            })
        })?;

        self.scheduler.add(reminder_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Reminder service started - checking every hour");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

/// Delivers every reminder due on `today` and records the delivery.
/// Returns how many were sent.
pub async fn send_due_reminders(
    sender: &dyn MessageSender,
    db: &DatabaseManager,
    today: NaiveDate,
) -> Result<usize, sqlx::Error> {
    let mut sent = 0;

    for reminder in Reminder::find_pending(&db.pool).await? {
        if !reminder.is_due(today) {
            continue;
        }

        let text = format_reminder(&reminder);
        match sender.send(reminder.user_id, &text).await {
            Ok(()) => {
                Reminder::mark_sent(&db.pool, &reminder.id, today).await?;
                sent += 1;
                tracing::info!("Sent reminder {} to user {}", reminder.id, reminder.user_id);
            }
            Err(e) => {
                tracing::error!("Failed to send reminder {} to user {}: {}", reminder.id, reminder.user_id, e);
            }
        }
    }

    Ok(sent)
}

fn format_reminder(reminder: &Reminder) -> String {
    let deadline = NaiveDate::parse_from_str(&reminder.deadline, "%Y-%m-%d")
        .map(|d| format_date(&d))
        .unwrap_or_else(|_| reminder.deadline.clone());

    match reminder.recurrence() {
        Recurrence::None => format!("⏰ Reminder: {}\n📅 Due: {}", reminder.task, deadline),
        recurrence => format!(
            "⏰ Reminder: {}\n📅 Since: {} ({})",
            reminder.task, deadline, recurrence
        ),
    }
}
