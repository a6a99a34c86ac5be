pub mod callback;
pub mod general_message;
pub mod message;

use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::services::{matching::MatchingEngine, rate_limit::RateLimiter};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Everything a command handler needs, shared across updates.
#[derive(Clone)]
pub struct BotContext {
    pub db: DatabaseManager,
    pub engine: Arc<MatchingEngine>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<Config>,
}

impl BotContext {
    pub fn new(db: DatabaseManager, engine: Arc<MatchingEngine>, config: Arc<Config>) -> Self {
        let rate_limiter = RateLimiter::new(
            db.clone(),
            config.command_cooldown_secs,
            config.matching.store_timeout,
        );

        Self {
            db,
            engine,
            rate_limiter,
            config,
        }
    }

    pub fn max_results(&self) -> usize {
        self.engine.settings().max_results
    }
}

pub struct BotHandler {
    pub ctx: BotContext,
}

impl BotHandler {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx }
    }

    pub fn schema(&self) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        let ctx = self.ctx.clone();
        let ctx_callback = self.ctx.clone();

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<crate::bot::commands::Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: crate::bot::commands::Command| {
                        let ctx = ctx.clone();
                        async move { message::command_handler(bot, msg, cmd, ctx).await }
                    }),
            )
            .branch(
                Update::filter_message().endpoint(|bot: Bot, msg: Message| async move {
                    general_message::handle_general_message(bot, msg).await
                }),
            )
            .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                let ctx = ctx_callback.clone();
                async move { callback::callback_handler(bot, q, ctx).await }
            }))
    }
}
