use teloxide::prelude::*;

use super::subcommand;
use crate::bot::commands::profile::format_contacts;
use crate::bot::handlers::BotContext;
use crate::error::{BotError, BotResult};
use crate::services::matching::{MatchQuery, StudyMatch};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, escape_markdown};
use crate::utils::validation::split_args;

pub const USAGE: &str = "/study find <course>, e.g. /study find CSE321";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyArgs {
    Find(MatchQuery),
}

pub fn parse_study_args(input: &str) -> BotResult<StudyArgs> {
    let args = split_args(input)?;

    match subcommand(&args).as_deref() {
        Some("find") if args.len() > 1 => {
            // "cse 321" arrives as two arguments
            let course = args[1..].join(" ");
            Ok(StudyArgs::Find(MatchQuery::new(&course, None)?))
        }
        Some("find") => Err(BotError::validation("Tell me which course, e.g. /study find CSE321.")),
        _ => Err(BotError::validation(format!(
            "Unknown /study arguments '{}'.",
            input.trim()
        ))),
    }
}

pub async fn handle_study(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("study", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let result = async {
        let StudyArgs::Find(query) = parse_study_args(&args)?;
        let partners = ctx.engine.find_study_partners(cmd.user_id, &query).await?;
        Ok::<_, BotError>((query, partners))
    }
    .await;

    match result {
        Ok((query, partners)) => {
            let title = format!("📚 Study partners for {}", query.course);
            feedback
                .send_markdown(format_study_matches(&title, &partners, ctx.max_results()))
                .await?;
            let details = format!("{} partners for {}", partners.len(), query.course);
            log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&details));
        }
        Err(e) => {
            feedback.report(&cmd, &e, USAGE).await?;
        }
    }

    Ok(())
}

/// MarkdownV2 list of the first `limit` matches, with a note when more exist.
pub fn format_study_matches(title: &str, matches: &[StudyMatch], limit: usize) -> String {
    let mut text = format!("{}\n\n", bold(title));

    for (i, m) in matches.iter().take(limit).enumerate() {
        let course = match &m.section {
            Some(section) => format!("{} section {}", m.course_code, section),
            None => m.course_code.clone(),
        };
        text.push_str(&format!(
            "{}\\. {} \\- {}, year {}\n   {}\n",
            i + 1,
            bold(&m.display_name),
            escape_markdown(&m.department),
            m.year,
            escape_markdown(&course)
        ));
        if !m.contacts.is_empty() {
            text.push_str(&format!("   📇 {}\n", escape_markdown(&format_contacts(&m.contacts))));
        }
    }

    if matches.len() > limit {
        text.push_str(&escape_markdown(&format!(
            "\n…and {} more. Narrow your search with a section: /match <course> <section>",
            matches.len() - limit
        )));
    }

    text
}
