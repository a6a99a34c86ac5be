/// Levenshtein-based similarity for course codes, sections and locations
pub mod fuzzy;
/// HTTP health endpoints
pub mod health;
/// Scheduled expiry of idle profiles and stale ride requests
pub mod maintenance;
/// Study partner, section peer and ride matching
pub mod matching;
/// Ride alerts and the message delivery port
pub mod notification;
/// Per-user command cooldowns
pub mod rate_limit;
/// Scheduled delivery of user reminders
pub mod reminder;
