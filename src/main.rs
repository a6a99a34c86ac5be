//! # UIU Study Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database, starts the
//! maintenance and reminder services and runs the Telegram bot next to the
//! health server.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uiu_study_bot::bot::handlers::{BotContext, BotHandler};
use uiu_study_bot::config::Config;
use uiu_study_bot::database::connection::DatabaseManager;
use uiu_study_bot::services::health::HealthService;
use uiu_study_bot::services::maintenance::MaintenanceService;
use uiu_study_bot::services::matching::MatchingEngine;
use uiu_study_bot::services::notification::{MessageSender, NotificationDispatcher, TelegramSender};
use uiu_study_bot::services::reminder::ReminderService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uiu_study_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    info!("Starting UIU Study Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, section threshold {}, ride tolerance {} min",
        config.database_url,
        config.http_port,
        config.matching.section_threshold,
        config.matching.time_tolerance_minutes
    );

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    // Initialize bot and the matching core
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let sender: Arc<dyn MessageSender> = Arc::new(TelegramSender::new(bot.clone(), config.send_timeout));
    let dispatcher = Arc::new(
        NotificationDispatcher::new(db_arc.as_ref().clone(), sender.clone())
            .with_store_timeout(config.matching.store_timeout),
    );
    let engine = Arc::new(
        MatchingEngine::new(db_arc.as_ref().clone(), config.matching.clone()).with_dispatcher(dispatcher),
    );
    let handler = BotHandler::new(BotContext::new(db_arc.as_ref().clone(), engine, config.clone()));
    info!("Telegram bot initialized successfully");

    // Expire idle profiles now, then daily
    let mut maintenance_service =
        MaintenanceService::new(db_arc.clone(), config.maintenance.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create maintenance service: {}", e))?;

    match maintenance_service.sweep_now().await {
        Ok(report) => info!(
            "Startup sweep removed {} idle profiles and {} stale ride requests",
            report.expired_profiles, report.expired_ride_requests
        ),
        Err(e) => tracing::error!("Startup sweep failed: {}", e),
    }

    if let Err(e) = maintenance_service.start().await {
        tracing::error!("Failed to start maintenance service: {}", e);
    } else {
        info!("Maintenance service started successfully");
    }

    // Initialize and start reminder service
    info!("Initializing reminder service...");
    let mut reminder_service = match ReminderService::new(sender.clone(), db_arc.clone()).await {
        Ok(service) => {
            info!("Reminder service initialized successfully");
            service
        }
        Err(e) => {
            tracing::error!("Failed to create reminder service: {}", e);
            return Err(anyhow::anyhow!("Failed to create reminder service: {}", e));
        }
    };

    if let Err(e) = reminder_service.start().await {
        tracing::error!("Failed to start reminder service: {}", e);
    } else {
        info!("Reminder service started successfully");
    }

    // Initialize health service
    let health_service = HealthService::new(db_arc.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    // Run both the bot and health server concurrently
    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = reminder_service.stop().await {
        tracing::warn!("Error stopping reminder service: {}", e);
    }
    if let Err(e) = maintenance_service.stop().await {
        tracing::warn!("Error stopping maintenance service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
