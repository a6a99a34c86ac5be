use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;

use super::{BotContext, HandlerResult};
use crate::bot::commands::calendar::{send_reminder_hint, ADD_REMINDER_CALLBACK};
use crate::bot::commands::{profile::render_profile, Command};

pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: BotContext) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    let username = q.from.username.as_deref().unwrap_or("unknown");
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat.id)
        .unwrap_or(ChatId(user_id));

    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).text("Invalid button").await?;
        return Ok(());
    };

    tracing::info!(
        "Callback received: '{}' from user {} ({}) in chat {}",
        data, username, user_id, chat_id.0
    );

    match data.as_str() {
        "profile:view" => {
            bot.answer_callback_query(q.id).await?;
            match render_profile(&ctx, user_id).await {
                Ok(text) => {
                    bot.send_message(chat_id, text)
                        .parse_mode(ParseMode::MarkdownV2)
                        .await?;
                }
                Err(e) => {
                    if e.is_infrastructure() {
                        tracing::error!("Failed to render profile for {}: {}", user_id, e);
                    }
                    bot.send_message(chat_id, e.user_message()).await?;
                }
            }
        }
        ADD_REMINDER_CALLBACK => {
            bot.answer_callback_query(q.id).await?;
            if let Err(e) = send_reminder_hint(&bot, chat_id, &ctx).await {
                tracing::error!("Failed to send reminder hint to {}: {}", user_id, e);
                bot.send_message(chat_id, e.user_message()).await?;
            }
        }
        "help" => {
            bot.answer_callback_query(q.id).await?;
            bot.send_message(chat_id, Command::descriptions().to_string()).await?;
        }
        _ => {
            bot.answer_callback_query(q.id)
                .text("This button is no longer supported")
                .await?;
        }
    }

    Ok(())
}
