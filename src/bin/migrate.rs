use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::io;
use std::path::Path;
use uiu_study_bot::config::Config;
use uiu_study_bot::database::connection::DatabaseManager;
use uiu_study_bot::database::models::CalendarEvent;
use uiu_study_bot::utils::datetime::parse_date;

/// One entry of a calendar import file.
#[derive(Debug, Deserialize)]
struct CalendarImportEntry {
    name: String,
    date: String,
    #[serde(default)]
    details: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize basic logging for the migration
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "import-calendar" => match args.get(2) {
            Some(path) => import_calendar(Path::new(path)).await,
            None => {
                eprintln!("import-calendar needs a JSON file path");
                print_help();
                std::process::exit(1);
            }
        },
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

async fn run_migrations() -> Result<()> {
    println!("🔧 UIU Study Bot - Database Migration Tool");
    println!("==========================================");

    dotenvy::dotenv().ok();
    let database_url = Config::database_url_from_env();

    println!("📊 Database URL: {}", mask_url(&database_url));

    ensure_sqlite_dir(&database_url)?;

    println!("🚀 Running database migrations...");

    let db_manager = DatabaseManager::new(&database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match db_manager.run_migrations().await {
        Ok(_) => {
            println!("✅ Migrations completed successfully!");
            println!("\n🎯 Your UIU Study Bot database is ready!");
        }
        Err(e) => {
            eprintln!("❌ Migration failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");

    dotenvy::dotenv().ok();
    let database_url = Config::database_url_from_env();

    println!("📊 Database URL: {}", mask_url(&database_url));

    let db_manager = DatabaseManager::new(&database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match check_tables(&db_manager).await {
        Ok(tables) => {
            println!("✅ Database connection successful!");
            println!("📋 Found tables:");
            for (table, rows) in tables {
                println!("  • {table} ({rows} rows)");
            }
        }
        Err(e) => {
            println!("⚠️  Database check failed: {e}");
            println!("💡 Try running 'migrate up' to create the schema");
        }
    }

    Ok(())
}

async fn reset_database() -> Result<()> {
    println!("⚠️  WARNING: This will delete ALL profiles, ride requests, reminders and snippets!");
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    dotenvy::dotenv().ok();
    let database_url = Config::database_url_from_env();

    let Some(db_path) = sqlite_path(&database_url) else {
        return Err(anyhow!("Reset is only supported for SQLite databases"));
    };

    if Path::new(db_path).exists() {
        std::fs::remove_file(db_path)?;
        println!("🗑️  Deleted database file: {db_path}");
    }

    println!("🔄 Recreating database schema...");
    run_migrations().await?;

    println!("✅ Database reset completed!");

    Ok(())
}

/// Loads academic calendar events from a JSON array of
/// `{"name": ..., "date": "YYYY-MM-DD", "details": ...}` objects.
async fn import_calendar(path: &Path) -> Result<()> {
    println!("🗓  Importing academic calendar from {}", path.display());

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: Vec<CalendarImportEntry> =
        serde_json::from_str(&raw).context("Calendar file must be a JSON array of events")?;

    dotenvy::dotenv().ok();
    let database_url = Config::database_url_from_env();
    ensure_sqlite_dir(&database_url)?;

    let db_manager = DatabaseManager::new(&database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;
    db_manager.run_migrations().await?;

    let mut imported = 0;
    for entry in entries {
        let date = parse_date(&entry.date)
            .with_context(|| format!("Invalid date for '{}'", entry.name))?;
        CalendarEvent::insert(&db_manager.pool, entry.name.trim(), date, entry.details.trim()).await?;
        imported += 1;
    }

    println!("✅ Imported {imported} calendar events");
    Ok(())
}

async fn check_tables(db_manager: &DatabaseManager) -> Result<Vec<(String, i64)>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx%' ORDER BY name",
    )
    .fetch_all(&db_manager.pool)
    .await?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        // Names come from sqlite_master, not user input
        let rows = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM \"{name}\""))
            .fetch_one(&db_manager.pool)
            .await?;
        tables.push((name, rows));
    }

    Ok(tables)
}

fn sqlite_path(url: &str) -> Option<&str> {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
}

fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    if let Some(db_path) = sqlite_path(database_url) {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                println!("📁 Creating directory: {}", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}

fn mask_url(url: &str) -> String {
    match sqlite_path(url).and_then(|path| Path::new(path).file_name()) {
        Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
        None => url.to_string(),
    }
}

fn print_help() {
    println!("🎓 UIU Study Bot - Database Migration Tool");
    println!();
    println!("USAGE:");
    println!("    migrate [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    migrate, up                  Run database migrations (default)");
    println!("    check                        Check database connection and schema");
    println!("    reset                        Reset database (SQLite only) - DESTRUCTIVE!");
    println!("    import-calendar <file.json>  Load academic calendar events");
    println!("    help                         Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    DATABASE_URL   Database connection string (default: sqlite:./data/study_bot.db)");
    println!();
    println!("EXAMPLES:");
    println!("    migrate                               # Run migrations");
    println!("    migrate check                         # Check database status");
    println!("    migrate import-calendar calendar.json # Import calendar events");
    println!();
}
