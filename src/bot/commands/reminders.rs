use chrono::{NaiveDate, Utc};
use teloxide::prelude::*;

use super::subcommand;
use crate::bot::commands::profile::send_failed;
use crate::bot::handlers::BotContext;
use crate::database::models::*;
use crate::error::{with_timeout, BotError, BotResult};
use crate::utils::datetime::{format_date, parse_date};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::{split_args, validate_task};

const MAX_REMINDERS: usize = 20;

pub const USAGE: &str = "/reminders add <task> <YYYY-MM-DD> [daily|weekly]\n\
Example: /reminders add Submit CSE321 lab report 2025-11-20\n\
Also: /reminders list, /reminders clear";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderArgs {
    Add {
        task: String,
        deadline: NaiveDate,
        recurrence: Recurrence,
    },
    List,
    Clear,
}

/// Parses reminder arguments; `today` bounds the earliest allowed deadline.
pub fn parse_reminder_args(input: &str, today: NaiveDate) -> BotResult<ReminderArgs> {
    let args = split_args(input)?;

    match subcommand(&args).as_deref() {
        None | Some("list") if args.len() <= 1 => Ok(ReminderArgs::List),
        Some("clear") if args.len() == 1 => Ok(ReminderArgs::Clear),
        Some("add") => parse_add(&args[1..], today),
        _ => Err(BotError::validation(format!(
            "Unknown /reminders arguments '{}'.",
            input.trim()
        ))),
    }
}

fn parse_add(args: &[String], today: NaiveDate) -> BotResult<ReminderArgs> {
    let (recurrence, rest) = match args.split_last() {
        Some((last, rest)) => match last.parse::<Recurrence>() {
            Ok(recurrence) => (recurrence, rest),
            Err(_) => (Recurrence::None, args),
        },
        None => (Recurrence::None, args),
    };

    let Some((date, task)) = rest.split_last().filter(|(_, task)| !task.is_empty()) else {
        return Err(BotError::validation("Give a task and a deadline, e.g. /reminders add Lab report 2025-11-20."));
    };

    let deadline = parse_date(date).map_err(|e| BotError::validation(e.to_string()))?;
    if deadline < today {
        return Err(BotError::validation("The deadline is already in the past."));
    }

    Ok(ReminderArgs::Add {
        task: validate_task(&task.join(" "))?,
        deadline,
        recurrence,
    })
}

pub async fn handle_reminders(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("reminders", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);
    let pool = &ctx.db.pool;
    let timeout = ctx.config.matching.store_timeout;

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let outcome: BotResult<()> = async {
        match parse_reminder_args(&args, Utc::now().date_naive())? {
            ReminderArgs::Add {
                task,
                deadline,
                recurrence,
            } => {
                let existing = with_timeout(timeout, "load reminders", Reminder::find_by_user(pool, cmd.user_id)).await?;
                if existing.len() >= MAX_REMINDERS {
                    return Err(BotError::validation(format!(
                        "You already have {MAX_REMINDERS} reminders. Clear some with /reminders clear."
                    )));
                }

                let reminder = with_timeout(
                    timeout,
                    "save reminder",
                    Reminder::create(pool, cmd.user_id, task, deadline, recurrence),
                )
                .await?;

                let when = match recurrence {
                    Recurrence::None => format!("on {}", format_date(&deadline)),
                    other => format!("{} from {}", other, format_date(&deadline)),
                };
                feedback
                    .success(&format!("Reminder set: {} ({}).", reminder.task, when))
                    .await
                    .map_err(send_failed)?;
                log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&reminder.id));
            }
            ReminderArgs::List => {
                let reminders = with_timeout(timeout, "load reminders", Reminder::find_by_user(pool, cmd.user_id)).await?;
                if reminders.is_empty() {
                    return Err(BotError::not_found("You have no reminders. Add one with /reminders add."));
                }

                let mut text = format!("{}\n\n", bold("⏰ Your reminders"));
                for reminder in &reminders {
                    let line = match reminder.recurrence() {
                        Recurrence::None => format!("• {} (due {})\n", reminder.task, reminder.deadline),
                        recurrence => format!("• {} ({} from {})\n", reminder.task, recurrence, reminder.deadline),
                    };
                    text.push_str(&escape_markdown(&line));
                }
                feedback.send_markdown(text).await.map_err(send_failed)?;
            }
            ReminderArgs::Clear => {
                let removed = with_timeout(timeout, "clear reminders", Reminder::delete_by_user(pool, cmd.user_id)).await?;
                if removed == 0 {
                    return Err(BotError::not_found("You have no reminders to clear."));
                }
                feedback
                    .success(&format!("Removed {removed} reminder(s)."))
                    .await
                    .map_err(send_failed)?;
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        feedback.report(&cmd, &e, USAGE).await?;
    }

    Ok(())
}
