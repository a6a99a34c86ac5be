use teloxide::prelude::*;

use super::subcommand;
use crate::bot::commands::profile::send_failed;
use crate::bot::handlers::BotContext;
use crate::database::models::CodeSnippet;
use crate::error::{with_timeout, BotError, BotResult};
use crate::utils::feedback::{CommandContext, CommandFeedback};
use crate::utils::logging::{log_command_start, log_command_success};
use crate::utils::markdown::{bold, code, escape_markdown};
use crate::utils::validation::{parse_tags, split_args, validate_snippet, validate_tag};

const MAX_SNIPPETS: i64 = 50;
const LIST_LIMIT: i64 = 10;

pub const USAGE: &str = "/codeshare add \"<description>\" <tags|-> <code>\n\
Example: /codeshare add \"Binary search\" cpp,search int lo = 0, hi = n - 1;\n\
Also: /codeshare list [tag]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeshareArgs {
    Add {
        description: String,
        tags: Vec<String>,
        code: String,
    },
    List {
        tag: Option<String>,
    },
}

pub fn parse_codeshare_args(input: &str) -> BotResult<CodeshareArgs> {
    let args = split_args(input)?;

    match subcommand(&args).as_deref() {
        None => Ok(CodeshareArgs::List { tag: None }),
        Some("list") => match &args[1..] {
            [] => Ok(CodeshareArgs::List { tag: None }),
            [tag] => Ok(CodeshareArgs::List {
                tag: Some(validate_tag(tag)?),
            }),
            _ => Err(BotError::validation("Filter by a single tag, e.g. /codeshare list rust.")),
        },
        Some("add") => {
            let [_, description, tags, code @ ..] = args.as_slice() else {
                return Err(BotError::validation(
                    "Give a description, tags and the code to save.",
                ));
            };
            let (description, code) = validate_snippet(description, &code.join(" "))?;
            Ok(CodeshareArgs::Add {
                description,
                tags: parse_tags(tags)?,
                code,
            })
        }
        _ => Err(BotError::validation(format!(
            "Unknown /codeshare arguments '{}'.",
            input.trim()
        ))),
    }
}

pub async fn handle_codeshare(bot: Bot, msg: Message, args: String, ctx: &BotContext) -> ResponseResult<()> {
    let cmd = CommandContext::from_message("codeshare", &msg);
    let feedback = CommandFeedback::new(bot, msg.chat.id);
    let pool = &ctx.db.pool;
    let timeout = ctx.config.matching.store_timeout;

    log_command_start(cmd.command, &cmd.username, cmd.user_id, Some(args.trim()));

    let outcome: BotResult<()> = async {
        match parse_codeshare_args(&args)? {
            CodeshareArgs::Add {
                description,
                tags,
                code,
            } => {
                let saved = with_timeout(timeout, "count snippets", CodeSnippet::count_by_user(pool, cmd.user_id)).await?;
                if saved >= MAX_SNIPPETS {
                    return Err(BotError::validation(format!(
                        "You already saved {MAX_SNIPPETS} snippets."
                    )));
                }

                let snippet = with_timeout(
                    timeout,
                    "save snippet",
                    CodeSnippet::create(pool, cmd.user_id, description, &tags, code),
                )
                .await?;

                let tag_note = if tags.is_empty() {
                    String::new()
                } else {
                    format!(" (tags: {})", tags.join(", "))
                };
                feedback
                    .success(&format!("Snippet saved: {}{}", snippet.description, tag_note))
                    .await
                    .map_err(send_failed)?;
                log_command_success(cmd.command, &cmd.username, cmd.user_id, Some(&snippet.id));
            }
            CodeshareArgs::List { tag } => {
                let snippets = with_timeout(
                    timeout,
                    "load snippets",
                    CodeSnippet::find_by_user(pool, cmd.user_id, tag.as_deref(), LIST_LIMIT),
                )
                .await?;

                if snippets.is_empty() {
                    return Err(BotError::not_found(match tag {
                        Some(tag) => format!("No snippets tagged '{tag}'."),
                        None => "You have no saved snippets. Add one with /codeshare add.".to_string(),
                    }));
                }

                feedback
                    .send_markdown(format_snippets(&snippets))
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

pub fn format_snippets(snippets: &[CodeSnippet]) -> String {
    let mut text = format!("{}\n\n", bold("💾 Your code snippets"));

    for snippet in snippets {
        text.push_str(&format!("• {}", bold(&snippet.description)));
        let tags = snippet.tag_list();
        if !tags.is_empty() {
            text.push_str(&escape_markdown(&format!(" [{}]", tags.join(", "))));
        }
        text.push_str(&format!("\n  {}\n", code(&snippet.snippet)));
    }

    text
}
