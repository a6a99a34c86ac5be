use teloxide::prelude::*;

use crate::error::BotResult;
use crate::utils::academics::{compute_cgpa, parse_grade_entries, CgpaReport};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::split_args;

pub const USAGE: &str = "/cgpa course:grade[:credits] ..., e.g. /cgpa CSE321:A CSE322:B+:1\n\
Grades: A, A-, B+, B, B-, C+, C. Credits default to 3.";

pub fn parse_cgpa_args(input: &str) -> BotResult<CgpaReport> {
    let args = split_args(input)?;
    compute_cgpa(parse_grade_entries(&args)?)
}

pub async fn handle_cgpa(bot: Bot, msg: Message, args: String) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("cgpa", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, None);

    match parse_cgpa_args(&args) {
        Ok(report) => {
            let mut text = format!("{}\n\n", bold("🎓 CGPA calculation"));
            for entry in &report.entries {
                text.push_str(&escape_markdown(&format!(
                    "• {}: {} ({:.1} points, {} credits)\n",
                    entry.course, entry.grade, entry.points, entry.credits
                )));
            }
            text.push_str(&format!(
                "\n{} {}",
                bold("CGPA:"),
                escape_markdown(&format!("{:.2} over {} credits", report.cgpa, report.total_credits))
            ));

            feedback.send_markdown(text).await?;
            let details = format!("{:.2}", report.cgpa);
            log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&details));
        }
        Err(e) => {
            feedback.report(&cmd, &e, USAGE).await?;
        }
    }

    Ok(())
}
