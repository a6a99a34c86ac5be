use teloxide::prelude::*;

use super::subcommand;
use crate::bot::commands::profile::send_failed;
use crate::bot::handlers::BotContext;
use crate::database::models::StudyProgress;
use crate::error::{with_timeout, BotError, BotResult};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::{split_args, validate_task};

/// Plan type recorded by `/studyplan` and shown when `/progress` has no argument.
pub const STUDY_PLAN: &str = "studyplan";

const MAX_PLAN_TYPE_LEN: usize = 20;

pub const USAGE: &str = "/progress [plan type]\n\
Example: /progress (shows your study plans)\n\
Mark a step done: /progress done Finished chapter 3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressArgs {
    Show { plan_type: String },
    Done { step: String },
}

pub fn parse_progress_args(input: &str) -> BotResult<ProgressArgs> {
    let args = split_args(input)?;

    match subcommand(&args).as_deref() {
        None => Ok(ProgressArgs::Show {
            plan_type: STUDY_PLAN.to_string(),
        }),
        Some("done") => {
            if args.len() < 2 {
                return Err(BotError::validation("Name the step you finished, e.g. /progress done Chapter 3."));
            }
            Ok(ProgressArgs::Done {
                step: validate_task(&args[1..].join(" "))?,
            })
        }
        Some(plan_type) if args.len() == 1 => {
            let valid = plan_type.chars().count() <= MAX_PLAN_TYPE_LEN
                && plan_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
            if !valid {
                return Err(BotError::validation(format!("Invalid plan type '{plan_type}'.")));
            }
            Ok(ProgressArgs::Show {
                plan_type: plan_type.to_string(),
            })
        }
        _ => Err(BotError::validation(format!(
            "Unknown /progress arguments '{}'.",
            input.trim()
        ))),
    }
}

pub async fn handle_progress(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("progress", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);
    let pool = &ctx.db.pool;
    let timeout = ctx.config.matching.store_timeout;

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let outcome: BotResult<()> = async {
        match parse_progress_args(&args)? {
            ProgressArgs::Show { plan_type } => {
                let rows = with_timeout(
                    timeout,
                    "load progress",
                    StudyProgress::find_by_user(pool, cmd.user_id, &plan_type),
                )
                .await?;

                if rows.is_empty() {
                    return Err(BotError::not_found(format!(
                        "No progress tracked for {plan_type}. Start with /studyplan."
                    )));
                }

                feedback
                    .send_markdown(format_progress(&plan_type, &rows))
                    .await
                    .map_err(send_failed)?;
            }
            ProgressArgs::Done { step } => {
                let updated = with_timeout(
                    timeout,
                    "update progress",
                    StudyProgress::complete_step(pool, cmd.user_id, STUDY_PLAN, &step),
                )
                .await?
                .ok_or_else(|| BotError::not_found("You have no study plan yet. Create one with /studyplan."))?;

                feedback
                    .success(&format!(
                        "Marked '{}' done. {} step(s) completed for {}.",
                        step,
                        updated.steps().len(),
                        updated.level
                    ))
                    .await
                    .map_err(send_failed)?;
                log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&updated.id));
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

pub fn format_progress(plan_type: &str, rows: &[StudyProgress]) -> String {
    let mut text = format!("{}\n\n", bold(&format!("📈 Progress on {plan_type}")));

    for row in rows {
        let steps = row.steps();
        text.push_str(&escape_markdown(&format!(
            "• {}: {} step(s) completed\n",
            row.level,
            steps.len()
        )));
        for step in &steps {
            text.push_str(&escape_markdown(&format!("   ✓ {step}\n")));
        }
    }

    text
}
