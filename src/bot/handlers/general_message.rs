use teloxide::prelude::*;

use super::HandlerResult;
use crate::utils::feedback::CommandFeedback;

pub async fn handle_general_message(bot: Bot, msg: Message) -> HandlerResult {
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    if let Some(text) = msg.text() {
        let lower = text.to_lowercase();

        if text.starts_with('/') {
            let command = text.split_whitespace().next().unwrap_or(text);
            let error_msg = format!("Unknown command: {command}");
            let suggestion = "Use /help to see all available commands, or check your command syntax.";
            feedback.validation_error(&error_msg, suggestion).await?;
        } else if lower.contains("study partner") || lower.contains("study buddy") {
            feedback
                .info("Looking for study partners? Try /study find <course>, e.g. /study find CSE321")
                .await?;
        } else if lower.contains("ride") || lower.contains("share a car") {
            feedback
                .info("Need a ride? Try /ride share <from> <to> <HH:MM>, e.g. /ride share Dhanmondi UIU 08:00")
                .await?;
        } else if lower.contains("help") {
            feedback.info("Use /help to see all available commands and examples!").await?;
        }
        // Anything else stays unanswered to avoid spam
    }

    Ok(())
}
