use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, ParseMode};

use crate::error::BotError;
use crate::utils::logging::{log_command_error, log_validation_error};
use crate::utils::markdown::escape_markdown;

/// Feedback types for different command outcomes
#[derive(Debug, Clone, Copy)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
    NotFound,
}

impl FeedbackType {
    fn emoji(&self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
            FeedbackType::NotFound => "🔍",
        }
    }
}

/// Context of the command a reply belongs to, used for logging.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub command: &'static str,
    pub user_id: i64,
    pub username: String,
}

impl CommandContext {
    pub fn from_message(command: &'static str, msg: &Message) -> Self {
        let user = msg.from();
        Self {
            command,
            user_id: user.map(|u| u.id.0 as i64).unwrap_or(msg.chat.id.0),
            username: user
                .and_then(|u| u.username.clone())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    pub fn username(&self) -> Option<String> {
        (self.username != "unknown").then(|| self.username.clone())
    }
}

/// Centralized feedback system for bot commands
pub struct CommandFeedback {
    bot: Bot,
    chat_id: ChatId,
}

impl CommandFeedback {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    /// Send a plain message with an outcome marker. The text is escaped.
    pub async fn send(&self, feedback_type: FeedbackType, message: &str) -> ResponseResult<Message> {
        let formatted_message = format!("{} {}", feedback_type.emoji(), escape_markdown(message));

        self.bot
            .send_message(self.chat_id, formatted_message)
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    /// Send text that is already valid MarkdownV2.
    pub async fn send_markdown(&self, markdown: String) -> ResponseResult<Message> {
        self.bot
            .send_message(self.chat_id, markdown)
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    /// Send MarkdownV2 text with inline buttons underneath.
    pub async fn send_markdown_with_keyboard(
        &self,
        markdown: String,
        keyboard: InlineKeyboardMarkup,
    ) -> ResponseResult<Message> {
        self.bot
            .send_message(self.chat_id, markdown)
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboard)
            .await
    }

    pub async fn success(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Success, message).await
    }

    pub async fn error(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Error, message).await
    }

    pub async fn warning(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Warning, message).await
    }

    pub async fn info(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Info, message).await
    }

    /// Send validation error with helpful suggestion
    pub async fn validation_error(&self, error: &str, suggestion: &str) -> ResponseResult<Message> {
        let message = format!("{error}\n\n💡 Suggestion: {suggestion}");
        self.send(FeedbackType::Error, &message).await
    }

    /// Reports a failed command. Infrastructure details are logged and the
    /// user only sees a generic retry message.
    pub async fn report(&self, ctx: &CommandContext, err: &BotError, usage: &str) -> ResponseResult<Message> {
        match err {
            BotError::Validation(msg) => {
                log_validation_error(ctx.command, msg, &ctx.username, ctx.user_id);
                self.validation_error(msg, usage).await
            }
            BotError::NotFound(msg) => self.send(FeedbackType::NotFound, msg).await,
            BotError::RateLimited { .. } => self.warning(&err.user_message()).await,
            BotError::Infrastructure(detail) => {
                log_command_error(ctx.command, &ctx.username, ctx.user_id, detail);
                self.error(&err.user_message()).await
            }
        }
    }
}
