#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};
use uiu_study_bot::database::{connection::DatabaseManager, models::*};
use uiu_study_bot::error::{BotError, BotResult};
use uiu_study_bot::services::notification::MessageSender;
use uiu_study_bot::services::reminder::send_due_reminders;

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(i64, String)>>,
    unreachable: Vec<i64>,
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, user_id: i64, text: &str) -> BotResult<()> {
        if self.unreachable.contains(&user_id) {
            return Err(BotError::Infrastructure("blocked by user".to_string()));
        }
        self.sent.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }
}

async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.to_string_lossy());

    let db = DatabaseManager::new(&db_url).await.unwrap();
    db.run_migrations().await.unwrap();
    (db, dir)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
}

#[tokio::test]
async fn test_one_off_reminder_is_sent_once() {
    let (db, _temp_dir) = setup_test_db().await;
    let sender = RecordingSender::default();
    Reminder::create(&db.pool, 42, "Lab report".to_string(), day(10), Recurrence::None)
        .await
        .unwrap();

    assert_eq!(send_due_reminders(&sender, &db, day(9)).await.unwrap(), 0);
    assert_eq!(send_due_reminders(&sender, &db, day(10)).await.unwrap(), 1);
    assert_eq!(send_due_reminders(&sender, &db, day(10)).await.unwrap(), 0);
    assert_eq!(send_due_reminders(&sender, &db, day(11)).await.unwrap(), 0);

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 42);
    assert!(sent[0].1.contains("Lab report"));
}

#[tokio::test]
async fn test_recurring_reminders_follow_their_schedule() {
    let (db, _temp_dir) = setup_test_db().await;
    let sender = RecordingSender::default();
    Reminder::create(&db.pool, 1, "Revise notes".to_string(), day(3), Recurrence::Daily)
        .await
        .unwrap();
    Reminder::create(&db.pool, 2, "Group study".to_string(), day(3), Recurrence::Weekly)
        .await
        .unwrap();

    assert_eq!(send_due_reminders(&sender, &db, day(3)).await.unwrap(), 2);
    assert_eq!(send_due_reminders(&sender, &db, day(4)).await.unwrap(), 1);
    assert_eq!(send_due_reminders(&sender, &db, day(10)).await.unwrap(), 2);

    let recipients: Vec<i64> = sender.sent.lock().unwrap().iter().map(|(id, _)| *id).collect();
    assert_eq!(recipients.iter().filter(|id| **id == 1).count(), 3);
    assert_eq!(recipients.iter().filter(|id| **id == 2).count(), 2);
}

#[tokio::test]
async fn test_failed_delivery_is_retried_next_run() {
    let (db, _temp_dir) = setup_test_db().await;
    Reminder::create(&db.pool, 7, "Quiz".to_string(), day(5), Recurrence::None)
        .await
        .unwrap();

    let blocked = RecordingSender {
        unreachable: vec![7],
        ..RecordingSender::default()
    };
    assert_eq!(send_due_reminders(&blocked, &db, day(5)).await.unwrap(), 0);

    let reachable = RecordingSender::default();
    assert_eq!(send_due_reminders(&reachable, &db, day(5)).await.unwrap(), 1);
}

#[test]
fn test_mock_sender_reports_unreachable_users() {
    let sender = RecordingSender {
        unreachable: vec![1],
        ..RecordingSender::default()
    };

    tokio_test::block_on(async {
        assert!(sender.send(1, "hi").await.is_err());
        assert!(sender.send(2, "hi").await.is_ok());
    });
    assert_eq!(sender.sent.lock().unwrap().len(), 1);
}
