use teloxide::prelude::*;

use crate::error::BotResult;
use crate::utils::academics::{parse_gpa_goal, predict_gpa, GpaGoal, GpaOutlook};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::validation::split_args;

pub const USAGE: &str = "/gpapredict <current CGPA> <target CGPA> [<completed credits> <remaining credits>]\n\
Example: /gpapredict 3.5 3.8 90 40";

pub fn parse_gpapredict_args(input: &str) -> BotResult<GpaGoal> {
    parse_gpa_goal(&split_args(input)?)
}

pub fn format_outlook(goal: &GpaGoal, outlook: GpaOutlook) -> String {
    let head = format!("🎯 From {:.2} to {:.2}: ", goal.current, goal.target);
    let body = match outlook {
        GpaOutlook::AlreadyMet => "you're already there. Keep your grades steady.".to_string(),
        GpaOutlook::Needs(required) => format!(
            "you need an average of {:.2} over your remaining credits.",
            required
        ),
        GpaOutlook::OutOfReach(required) => format!(
            "you would need {:.2} over your remaining credits, which is above 4.00. Consider a closer target.",
            required
        ),
        GpaOutlook::Gap(gap) => format!(
            "{:.2} points to go. Add completed and remaining credits for the exact average you need, e.g. /gpapredict {:.2} {:.2} 90 40",
            gap, goal.current, goal.target
        ),
    };
    head + &body
}

pub async fn handle_gpapredict(bot: Bot, msg: Message, args: String) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("gpapredict", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    match parse_gpapredict_args(&args) {
        Ok(goal) => {
            feedback.info(&format_outlook(&goal, predict_gpa(&goal))).await?;
            log_command_success(cmd.command, &cmd.username, cmd.user_id, None);
        }
        Err(e) => {
            feedback.report(&cmd, &e, USAGE).await?;
        }
    }

    Ok(())
}
