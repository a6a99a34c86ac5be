use teloxide::prelude::*;

use crate::bot::commands::study::format_study_matches;
use crate::bot::handlers::BotContext;
use crate::error::{BotError, BotResult};
use crate::services::matching::MatchQuery;
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::validation::split_args;

pub const USAGE: &str = "/match <course> <section>, e.g. /match CSE321 A";

/// `/match <course> <section>`. The last argument is the section so that
/// `cse 321 A` still reads as course `CSE321`.
pub fn parse_match_args(input: &str) -> BotResult<MatchQuery> {
    let args = split_args(input)?;

    let Some((section, course)) = args.split_last().filter(|(_, course)| !course.is_empty()) else {
        return Err(BotError::validation("Give both a course and a section, e.g. /match CSE321 A."));
    };

    MatchQuery::new(&course.join(" "), Some(section.as_str()))
}

pub async fn handle_match(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("match", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let result = async {
        let query = parse_match_args(&args)?;
        let peers = ctx.engine.find_section_peers(cmd.user_id, &query).await?;
        Ok::<_, BotError>((query, peers))
    }
    .await;

    match result {
        Ok((query, peers)) => {
            let title = format!(
                "👥 Classmates in {} section {}",
                query.course,
                query.section.as_deref().unwrap_or_default()
            );
            feedback
                .send_markdown(format_study_matches(&title, &peers, ctx.max_results()))
                .await?;
            let details = format!("{} peers for {}", peers.len(), query.course);
            log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&details));
        }
        Err(e) => {
            feedback.report(&cmd, &e, USAGE).await?;
        }
    }

    Ok(())
}
