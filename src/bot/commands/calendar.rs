use chrono::{NaiveDate, Utc};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::commands::profile::send_failed;
use crate::bot::handlers::BotContext;
use crate::database::models::CalendarEvent;
use crate::error::{with_timeout, BotError, BotResult};
use crate::utils::datetime::format_date;
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, escape_markdown};

const UPCOMING_LIMIT: i64 = 10;

/// Callback data of the "Add Reminder" button under the calendar.
pub const ADD_REMINDER_CALLBACK: &str = "calendar:reminder";

pub async fn handle_calendar(bot: Bot, msg: Message, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("calendar", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, None);

    let outcome: BotResult<usize> = async {
        ctx.rate_limiter.check(cmd.user_id, cmd.command).await?;

        let events = with_timeout(
            ctx.config.matching.store_timeout,
            "load calendar events",
            CalendarEvent::find_upcoming(&ctx.db.pool, Utc::now().date_naive(), UPCOMING_LIMIT),
        )
        .await?;

        if events.is_empty() {
            return Err(BotError::not_found("No upcoming academic calendar events."));
        }

        feedback
            .send_markdown_with_keyboard(format_calendar(&events), calendar_keyboard())
            .await
            .map_err(send_failed)?;
        Ok(events.len())
    }
    .await;

    match outcome {
        Ok(count) => {
            let details = format!("{count} events");
            log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&details));
        }
        Err(e) => {
            feedback.report(&cmd, &e, "/calendar").await?;
        }
    }

    Ok(())
}

pub fn format_calendar(events: &[CalendarEvent]) -> String {
    let mut text = format!("{}\n\n", bold("🗓 Academic calendar"));

    for event in events {
        let date = NaiveDate::parse_from_str(&event.event_date, "%Y-%m-%d")
            .map(|d| format_date(&d))
            .unwrap_or_else(|_| event.event_date.clone());

        text.push_str(&format!("{} {}\n", bold(&date), escape_markdown(&event.name)));
        if !event.details.is_empty() {
            text.push_str(&format!("   {}\n", escape_markdown(&event.details)));
        }
    }

    text
}

pub fn calendar_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⏰ Add Reminder",
        ADD_REMINDER_CALLBACK,
    )]])
}

/// How to turn a calendar event into a reminder, using `next` as the example
/// when there is one.
pub fn reminder_hint(next: Option<&CalendarEvent>) -> String {
    let example = match next {
        Some(event) => format!("/reminders add {} {}", event.name, event.event_date),
        None => "/reminders add Midterm week 2025-03-10".to_string(),
    };
    format!(
        "To get reminded about an event, use /reminders add <event name> <YYYY-MM-DD> [daily|weekly]\nExample: {example}"
    )
}

/// Sends [`reminder_hint`] for the next upcoming event.
pub async fn send_reminder_hint(bot: &Bot, chat_id: ChatId, ctx: &BotContext) -> BotResult<()> {
    let next = with_timeout(
        ctx.config.matching.store_timeout,
        "load next calendar event",
        CalendarEvent::find_upcoming(&ctx.db.pool, Utc::now().date_naive(), 1),
    )
    .await?;

    bot.send_message(chat_id, reminder_hint(next.first()))
        .await
        .map_err(send_failed)?;
    Ok(())
}
