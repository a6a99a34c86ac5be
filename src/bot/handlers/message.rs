use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;

use super::{BotContext, HandlerResult};
use crate::bot::commands::{self, Command};
use crate::database::models::Profile;
use crate::error::with_timeout;

pub const WELCOME_TEXT: &str = "🎓 Welcome to UIU Study Bot!\n\n\
Find study partners with /study find <course>, classmates in your section with /match <course> <section>, \
and people heading your way with /ride share <from> <to> <HH:MM>.\n\n\
Start by creating your profile with /profile set. Use /help to see all commands.";

pub async fn command_handler(bot: Bot, msg: Message, cmd: Command, ctx: BotContext) -> HandlerResult {
    if let Some(user) = msg.from() {
        refresh_activity(&ctx, user.id.0 as i64).await;
    }

    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
        }
        Command::Start => {
            bot.send_message(msg.chat.id, WELCOME_TEXT)
                .reply_markup(start_keyboard())
                .await?;
        }
        Command::Study(args) => commands::study::handle_study(bot, msg, args, &ctx).await?,
        Command::Match(args) => commands::peers::handle_match(bot, msg, args, &ctx).await?,
        Command::Ride(args) => commands::ride::handle_ride(bot, msg, args, &ctx).await?,
        Command::Profile(args) => commands::profile::handle_profile(bot, msg, args, &ctx).await?,
        Command::Cgpa(args) => commands::cgpa::handle_cgpa(bot, msg, args).await?,
        Command::Gpapredict(args) => commands::gpapredict::handle_gpapredict(bot, msg, args).await?,
        Command::Studyplan(args) => commands::studyplan::handle_studyplan(bot, msg, args, &ctx).await?,
        Command::Progress(args) => commands::progress::handle_progress(bot, msg, args, &ctx).await?,
        Command::Reminders(args) => commands::reminders::handle_reminders(bot, msg, args, &ctx).await?,
        Command::Calendar => commands::calendar::handle_calendar(bot, msg, &ctx).await?,
        Command::Codeshare(args) => commands::codeshare::handle_codeshare(bot, msg, args, &ctx).await?,
    }

    Ok(())
}

pub fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("👤 View Profile", "profile:view"),
        InlineKeyboardButton::callback("❓ Help", "help"),
    ]])
}

/// Refreshes `last_active` for users with a profile. A failure here must not
/// block the command itself.
async fn refresh_activity(ctx: &BotContext, user_id: i64) {
    let touched = with_timeout(
        ctx.config.matching.store_timeout,
        "refresh last_active",
        Profile::touch(&ctx.db.pool, user_id),
    )
    .await;

    if let Err(e) = touched {
        tracing::warn!("Failed to refresh activity for user {}: {}", user_id, e);
    }
}
