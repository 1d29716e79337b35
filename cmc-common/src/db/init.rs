//! Database initialization
//!
//! Opens (creating if needed) the SQLite database, creates every table with
//! `CREATE TABLE IF NOT EXISTS`, runs versioned migrations, then seeds
//! default settings and the single onboarding workflow row. Safe to call on
//! every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Busy timeout applied to every connection (ms)
const BUSY_TIMEOUT_MS: i64 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Per-connection pragmas; foreign keys are off by default in SQLite
                sqlx::query("PRAGMA foreign_keys = ON")
                    .execute(&mut *conn)
                    .await?;
                sqlx::query(&format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;
    init_default_settings(&pool).await?;
    init_onboarding_workflow(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_onboarding_tables(pool).await?;
    create_user_checklists_table(pool).await?;
    create_departments_table(pool).await?;
    create_employees_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores organization configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('super_admin', 'office_admin', 'hr_manager', 'employee')),
            full_name TEXT,
            contact_number TEXT,
            address TEXT,
            emergency_contact TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            password_changed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_onboarding_tables(pool: &SqlitePool) -> Result<()> {
    // Single-row table: id is pinned to 1
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS onboarding_workflow (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            current_phase TEXT NOT NULL CHECK (current_phase IN ('super_admin', 'office_admin', 'hr_manager', 'completed')),
            started_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT,
            updated_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS onboarding_transitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            from_phase TEXT NOT NULL,
            to_phase TEXT NOT NULL,
            actor_guid TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_checklists_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_checklists (
            user_guid TEXT PRIMARY KEY REFERENCES users(guid) ON DELETE CASCADE,
            items TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_departments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            guid TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_employees_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            guid TEXT PRIMARY KEY,
            employee_number TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            department_guid TEXT REFERENCES departments(guid) ON DELETE RESTRICT,
            position TEXT,
            employment_status TEXT NOT NULL CHECK (employment_status IN ('probationary', 'regular', 'contractual', 'resigned')),
            hire_date TEXT NOT NULL,
            monthly_salary_centavos INTEGER NOT NULL DEFAULT 0 CHECK (monthly_salary_centavos >= 0),
            sss_number TEXT,
            philhealth_number TEXT,
            pagibig_number TEXT,
            tin TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize default settings
///
/// Existing values are never overwritten; NULL values are reset.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "organization_name", "Cathay Metal Corporation").await?;
    ensure_setting(pool, "organization_address", "").await?;
    ensure_setting(pool, "payroll_frequency", "semi_monthly").await?;
    Ok(())
}

/// Insert a setting if missing, or reset it if NULL
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let existing: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match existing {
        None => {
            // INSERT OR IGNORE handles concurrent initialization
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            info!("Reset NULL setting '{}' to default value: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}

/// Seed the onboarding workflow row in its first phase
async fn init_onboarding_workflow(pool: &SqlitePool) -> Result<()> {
    let now = crate::time::now_rfc3339();
    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO onboarding_workflow (id, current_phase, started_at, updated_at)
        VALUES (1, 'super_admin', ?, ?)
        "#,
    )
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted > 0 {
        info!("Started system onboarding workflow (phase: super_admin)");
    }

    Ok(())
}
