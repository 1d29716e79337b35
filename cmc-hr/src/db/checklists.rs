//! Stored onboarding checklists (`user_checklists.items` JSON)

use cmc_common::{time, Result};
use sqlx::SqlitePool;
use tracing::warn;

use super::users::User;
use crate::checklist::Checklist;

/// Stored checklist, `None` if absent or unreadable
pub async fn load(pool: &SqlitePool, user_guid: &str) -> Result<Option<Checklist>> {
    let items: Option<String> =
        sqlx::query_scalar("SELECT items FROM user_checklists WHERE user_guid = ?")
            .bind(user_guid)
            .fetch_optional(pool)
            .await?;

    let Some(items) = items else {
        return Ok(None);
    };

    match Checklist::from_json(&items) {
        Ok(checklist) => Ok(Some(checklist)),
        Err(e) => {
            warn!("Discarding malformed checklist for user {}: {}", user_guid, e);
            Ok(None)
        }
    }
}

pub async fn save(pool: &SqlitePool, user_guid: &str, checklist: &Checklist) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_checklists (user_guid, items, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_guid) DO UPDATE SET items = excluded.items, updated_at = excluded.updated_at
        "#,
    )
    .bind(user_guid)
    .bind(checklist.to_json()?)
    .bind(time::now_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Current checklist for `user`, aligned with their role and profile
///
/// Creates the role defaults on first use and persists whenever the
/// reconciled checklist differs from what was stored.
pub async fn load_or_create(pool: &SqlitePool, user: &User) -> Result<Checklist> {
    let stored = load(pool, &user.guid).await?;
    let is_new = stored.is_none();
    let mut checklist = stored.unwrap_or_else(|| Checklist::defaults_for(user.role));

    let role_changed = checklist.reconcile_role(user.role);
    let profile_changed = checklist.sync_with_profile(&user.profile_fields());

    if is_new || role_changed || profile_changed {
        save(pool, &user.guid, &checklist).await?;
    }

    Ok(checklist)
}
