//! Tests for database initialization
//!
//! - Automatic database creation with default schema
//! - Default settings initialization
//! - Onboarding workflow row seeded exactly once

use cmc_common::db::init::init_database;
use cmc_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("cmc.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cmc.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("cmc.db")).await.unwrap();

    for table in [
        "schema_version",
        "settings",
        "users",
        "sessions",
        "onboarding_workflow",
        "onboarding_transitions",
        "user_checklists",
        "departments",
        "employees",
    ] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "Missing table: {}", table);
    }

    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("cmc.db")).await.unwrap();

    let name: String =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'organization_name'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(name, "Cathay Metal Corporation");

    let frequency: String =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'payroll_frequency'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(frequency, "semi_monthly");
}

#[tokio::test]
async fn test_existing_settings_preserved_and_null_reset() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cmc.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("UPDATE settings SET value = 'Cathay Metal Corp.' WHERE key = 'organization_name'")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'payroll_frequency'")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();

    let name: String =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'organization_name'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(name, "Cathay Metal Corp.");

    let frequency: String =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'payroll_frequency'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(frequency, "semi_monthly");
}

#[tokio::test]
async fn test_onboarding_workflow_seeded_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cmc.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("UPDATE onboarding_workflow SET current_phase = 'hr_manager' WHERE id = 1")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM onboarding_workflow")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let phase: String = sqlx::query_scalar("SELECT current_phase FROM onboarding_workflow")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(phase, "hr_manager", "Re-initialization must not reset the workflow");
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("cmc.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO sessions (token, user_guid, created_at, expires_at) VALUES ('t', 'no-such-user', 'x', 'y')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "Session for unknown user should violate the foreign key");
}
