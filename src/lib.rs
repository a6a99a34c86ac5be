//! # UIU Study Bot
//!
//! A Telegram bot that helps university students find study partners,
//! share rides and keep track of their academic life.
//!
//! ## Features
//! - Study partner and section peer matching with fuzzy course/section comparison
//! - Ride sharing with route and departure time matching plus push notifications
//! - Student profiles that expire after months of inactivity
//! - CGPA calculation, study plans, reminders and the academic calendar
//! - Persistent storage with SQLite

/// Bot command handlers and message processing
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Error taxonomy shared by the matching engine and command handlers
pub mod error;
/// Matching engine, notifications and background maintenance
pub mod services;
/// Utility functions for datetime, validation, and formatting
pub mod utils;
