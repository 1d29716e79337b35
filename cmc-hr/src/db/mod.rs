//! Database access layer for cmc-hr
//!
//! Schema creation lives in `cmc_common::db`; these modules hold the
//! queries each API area needs.

pub mod checklists;
pub mod departments;
pub mod employees;
pub mod onboarding;
pub mod sessions;
pub mod settings;
pub mod users;

pub use cmc_common::db::init_database;

/// `%term%` pattern for LIKE searches, with wildcards in the term escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// Fresh database in a temporary directory; keep the `TempDir` alive
    pub async fn test_pool() -> (SqlitePool, TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let pool = cmc_common::db::init_database(&dir.path().join("cmc.db"))
            .await
            .expect("database init");
        (pool, dir)
    }
}
