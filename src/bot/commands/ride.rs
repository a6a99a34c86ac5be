use teloxide::prelude::*;

use super::subcommand;
use crate::bot::commands::profile::{format_contacts, send_failed};
use crate::bot::handlers::BotContext;
use crate::error::{BotError, BotResult};
use crate::services::matching::{RideMatch, RideQuery, RouteSource};
use crate::utils::datetime::parse_clock_time;
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success, log_system_event};
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::split_args;

pub const USAGE: &str = "/ride share <from> <to> <HH:MM>, e.g. /ride share Dhanmondi UIU 08:00\n\
Quote places with spaces: /ride share \"Mirpur 10\" UIU 08:00\n\
Also: /ride status, /ride cancel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideArgs {
    Share(RideQuery),
    Status,
    Cancel,
}

pub fn parse_ride_args(input: &str) -> BotResult<RideArgs> {
    let args = split_args(input)?;

    match subcommand(&args).as_deref() {
        Some("share") => {
            let [_, from, to, time] = args.as_slice() else {
                return Err(BotError::validation(
                    "Give a start, a destination and a time, e.g. /ride share Dhanmondi UIU 08:00.",
                ));
            };
            let time = parse_clock_time(time).map_err(|e| BotError::validation(e.to_string()))?;
            Ok(RideArgs::Share(RideQuery::new(from, to, time)?))
        }
        Some("status") if args.len() == 1 => Ok(RideArgs::Status),
        Some("cancel") if args.len() == 1 => Ok(RideArgs::Cancel),
        _ => Err(BotError::validation(format!(
            "Unknown /ride arguments '{}'.",
            input.trim()
        ))),
    }
}

pub async fn handle_ride(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("ride", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let outcome: BotResult<()> = async {
        match parse_ride_args(&args)? {
            RideArgs::Share(query) => {
                let found = ctx.engine.find_ride_matches(cmd.user_id, &query).await?;

                let title = format!("🚗 Rides from {} to {}", query.from, query.to);
                feedback
                    .send_markdown(format_ride_matches(&title, &found.matches, ctx.max_results()))
                    .await
                    .map_err(send_failed)?;

                if let Some(handle) = found.notifications {
                    let request_id = found.request.id.clone();
                    tokio::spawn(async move {
                        match handle.await {
                            Ok(report) => {
                                let details = format!(
                                    "request {}: {} sent, {} skipped, {} failed",
                                    request_id, report.sent, report.skipped, report.failed
                                );
                                log_system_event("Ride alerts dispatched", Some(&details));
                            }
                            Err(e) => tracing::error!("Ride alert task for {} panicked: {}", request_id, e),
                        }
                    });
                }

                let details = format!("{} ride matches", found.matches.len());
                log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&details));
            }
            RideArgs::Status => {
                let request = ctx
                    .engine
                    .active_ride(cmd.user_id)
                    .await?
                    .ok_or_else(|| BotError::not_found("You have no active ride request. Share one with /ride share."))?;
                let message = format!(
                    "Your ride request: {} → {} at {}.",
                    request.from_location, request.to_location, request.ride_time
                );
                feedback.info(&message).await.map_err(send_failed)?;
            }
            RideArgs::Cancel => {
                if !ctx.engine.cancel_ride(cmd.user_id).await? {
                    return Err(BotError::not_found("You have no active ride request to cancel."));
                }
                feedback.success("Your ride request was cancelled.").await.map_err(send_failed)?;
                log_command_success(cmd.command, &cmd.username, cmd.user_id, Some("cancelled"));
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

pub fn format_ride_matches(title: &str, matches: &[RideMatch], limit: usize) -> String {
    let mut text = format!("{}\n\n", bold(title));

    for (i, m) in matches.iter().take(limit).enumerate() {
        let route = format!("{} → {} at {}", m.from_location, m.to_location, m.ride_time);
        let kind = match m.source {
            RouteSource::Request => "ride request",
            RouteSource::Commute => "daily commute",
        };
        text.push_str(&format!(
            "{}\\. {} \\- {}\n   {} \\({}\\)\n",
            i + 1,
            bold(&m.display_name),
            escape_markdown(&m.department),
            escape_markdown(&route),
            kind
        ));
        if !m.contacts.is_empty() {
            text.push_str(&format!("   📇 {}\n", escape_markdown(&format_contacts(&m.contacts))));
        }
    }

    if matches.len() > limit {
        text.push_str(&escape_markdown(&format!("\n…and {} more.", matches.len() - limit)));
    }

    text.push_str(&escape_markdown(
        "\nMatched riders who opted in get a one-time alert about your request.",
    ));

    text
}
