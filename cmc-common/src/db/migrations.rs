//! Database schema migrations
//!
//! Versioned migrations tracked in the `schema_version` table. Tables are
//! created with their current shape by [`crate::db::init::create_schema`];
//! migrations bring databases created by older builds up to date.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - They must remain stable for upgrading databases
//! 2. **Always add new migrations** - One function per schema change
//! 3. **Idempotent** - Check before altering; safe to run multiple times
//! 4. **Use ALTER TABLE** - Prefer ALTER TABLE over DROP/CREATE to preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Migration v1: lookup indexes for listing filters
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: listing indexes");

    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department_guid)",
        "CREATE INDEX IF NOT EXISTS idx_employees_last_name ON employees(last_name)",
        "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
        "CREATE INDEX IF NOT EXISTS idx_onboarding_transitions_created ON onboarding_transitions(created_at)",
    ] {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// Migration v2: record who last moved the onboarding workflow
///
/// Databases from before v2 lack `onboarding_workflow.updated_by`.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: onboarding_workflow.updated_by");

    add_column_if_missing(pool, "onboarding_workflow", "updated_by", "TEXT").await
}

/// `ALTER TABLE ... ADD COLUMN` unless the column already exists
async fn add_column_if_missing(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    sql_type: &str,
) -> Result<()> {
    let has_column: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = ?",
        table
    ))
    .bind(column)
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  {}.{} already exists - skipping", table, column);
        return Ok(());
    }

    // Catch duplicate column error for concurrent initialization race conditions
    match sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, sql_type))
        .execute(pool)
        .await
    {
        Ok(_) => {
            info!("  ✓ Added {} column to {} table", column, table);
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            info!("  {}.{} added by concurrent initialization - skipping", table, column);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
