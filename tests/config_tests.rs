use std::env;
use std::sync::Mutex;
use std::time::Duration;
use uiu_study_bot::config::Config;

// Mutex to ensure config tests run sequentially to avoid environment variable conflicts
static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

const OPTIONAL_VARS: &[&str] = &[
    "DATABASE_URL",
    "HTTP_PORT",
    "MATCH_SECTION_THRESHOLD",
    "MATCH_LOCATION_THRESHOLD",
    "RIDE_TIME_TOLERANCE_MINUTES",
    "MATCH_MAX_RESULTS",
    "STORE_TIMEOUT_SECS",
    "PROFILE_TTL_DAYS",
    "RIDE_REQUEST_TTL_HOURS",
    "COMMAND_COOLDOWN_SECS",
    "SEND_TIMEOUT_SECS",
];

fn clear_env() {
    env::remove_var("TELEGRAM_BOT_TOKEN");
    for var in OPTIONAL_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_config_from_env_with_all_vars() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "test_token_123");
    env::set_var("DATABASE_URL", "sqlite:test.db");
    env::set_var("HTTP_PORT", "8080");
    env::set_var("MATCH_SECTION_THRESHOLD", "95");
    env::set_var("RIDE_TIME_TOLERANCE_MINUTES", "45");
    env::set_var("MATCH_MAX_RESULTS", "5");
    env::set_var("PROFILE_TTL_DAYS", "90");
    env::set_var("COMMAND_COOLDOWN_SECS", "60");

    let config = Config::from_env().unwrap();

    assert_eq!(config.telegram_bot_token, "test_token_123");
    assert_eq!(config.database_url, "sqlite:test.db");
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.matching.section_threshold, 95);
    assert_eq!(config.matching.time_tolerance_minutes, 45);
    assert_eq!(config.matching.max_results, 5);
    assert_eq!(config.maintenance.profile_ttl_days, 90);
    assert_eq!(config.command_cooldown_secs, 60);

    clear_env();
}

#[test]
fn test_config_from_env_with_defaults() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "required_token");

    let config = Config::from_env().unwrap();

    assert_eq!(config.telegram_bot_token, "required_token");
    assert_eq!(config.database_url, "sqlite:./data/study_bot.db");
    assert_eq!(config.http_port, 3000);
    assert_eq!(config.matching.section_threshold, 90);
    assert_eq!(config.matching.location_threshold, 80);
    assert_eq!(config.matching.time_tolerance_minutes, 30);
    assert_eq!(config.matching.max_results, 10);
    assert_eq!(config.matching.store_timeout, Duration::from_secs(10));
    assert_eq!(config.maintenance.profile_ttl_days, 150);
    assert_eq!(config.maintenance.ride_request_ttl_hours, 24);
    assert_eq!(config.command_cooldown_secs, 30);
    assert_eq!(config.send_timeout, Duration::from_secs(10));

    clear_env();
}

#[test]
fn test_config_missing_required_token() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    let result = Config::from_env();
    assert!(result.is_err());

    let error_msg = result.unwrap_err().to_string();
    assert!(error_msg.contains("TELEGRAM_BOT_TOKEN must be set"));
}

#[test]
fn test_config_rejects_out_of_range_values() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("TELEGRAM_BOT_TOKEN", "token");

    for (var, value) in [
        ("MATCH_SECTION_THRESHOLD", "0"),
        ("MATCH_LOCATION_THRESHOLD", "101"),
        ("RIDE_TIME_TOLERANCE_MINUTES", "-5"),
        ("MATCH_MAX_RESULTS", "0"),
        ("PROFILE_TTL_DAYS", "0"),
        ("HTTP_PORT", "not_a_port"),
    ] {
        env::set_var(var, value);
        assert!(Config::from_env().is_err(), "{var}={value} should be rejected");
        env::remove_var(var);
    }

    clear_env();
}

#[test]
fn test_database_url_without_token() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    assert_eq!(Config::database_url_from_env(), "sqlite:./data/study_bot.db");
    env::set_var("DATABASE_URL", "sqlite:other.db");
    assert_eq!(Config::database_url_from_env(), "sqlite:other.db");

    clear_env();
}
