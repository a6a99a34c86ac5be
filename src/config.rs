use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    pub matching: MatchSettings,
    pub maintenance: MaintenanceSettings,
    pub command_cooldown_secs: u64,
    pub send_timeout: Duration,
}

/// Tunables for the peer and ride matching engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    /// Courses are compared exactly after normalization; sections fuzzily.
    pub section_threshold: u8,
    pub location_threshold: u8,
    pub time_tolerance_minutes: i64,
    pub max_results: usize,
    pub store_timeout: Duration,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            section_threshold: 90,
            location_threshold: 80,
            time_tolerance_minutes: 30,
            max_results: 10,
            store_timeout: Duration::from_secs(10),
        }
    }
}

/// Retention rules applied by the maintenance sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceSettings {
    pub profile_ttl_days: i64,
    pub ride_request_ttl_hours: i64,
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            profile_ttl_days: 150,
            ride_request_ttl_hours: 24,
        }
    }
}

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/study_bot.db";

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = Self::database_url_from_env();

        let http_port = env_or("HTTP_PORT", 3000u16)?;

        let defaults = MatchSettings::default();
        let matching = MatchSettings {
            section_threshold: threshold_from_env("MATCH_SECTION_THRESHOLD", defaults.section_threshold)?,
            location_threshold: threshold_from_env("MATCH_LOCATION_THRESHOLD", defaults.location_threshold)?,
            time_tolerance_minutes: env_or("RIDE_TIME_TOLERANCE_MINUTES", defaults.time_tolerance_minutes)?,
            max_results: env_or("MATCH_MAX_RESULTS", defaults.max_results)?,
            store_timeout: Duration::from_secs(env_or("STORE_TIMEOUT_SECS", 10u64)?),
        };

        if matching.time_tolerance_minutes < 0 || matching.time_tolerance_minutes > 720 {
            return Err(anyhow!("RIDE_TIME_TOLERANCE_MINUTES must be between 0 and 720"));
        }
        if matching.max_results == 0 {
            return Err(anyhow!("MATCH_MAX_RESULTS must be at least 1"));
        }

        let maintenance_defaults = MaintenanceSettings::default();
        let maintenance = MaintenanceSettings {
            profile_ttl_days: env_or("PROFILE_TTL_DAYS", maintenance_defaults.profile_ttl_days)?,
            ride_request_ttl_hours: env_or("RIDE_REQUEST_TTL_HOURS", maintenance_defaults.ride_request_ttl_hours)?,
        };

        if maintenance.profile_ttl_days <= 0 || maintenance.ride_request_ttl_hours <= 0 {
            return Err(anyhow!("PROFILE_TTL_DAYS and RIDE_REQUEST_TTL_HOURS must be positive"));
        }

        Ok(Config {
            telegram_bot_token: token,
            database_url,
            http_port,
            matching,
            maintenance,
            command_cooldown_secs: env_or("COMMAND_COOLDOWN_SECS", 30u64)?,
            send_timeout: Duration::from_secs(env_or("SEND_TIMEOUT_SECS", 10u64)?),
        })
    }

    /// `DATABASE_URL`, or the default SQLite file. Tools that only touch the
    /// database use this without requiring a bot token.
    pub fn database_url_from_env() -> String {
        env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid {}", key)),
        _ => Ok(default),
    }
}

fn threshold_from_env(key: &str, default: u8) -> Result<u8> {
    let value: u8 = env_or(key, default)?;
    if value == 0 || value > 100 {
        return Err(anyhow!("{} must be between 1 and 100", key));
    }
    Ok(value)
}
