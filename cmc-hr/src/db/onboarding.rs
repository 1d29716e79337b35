//! Persisted onboarding workflow state and transition history

use cmc_common::{time, Error, Result};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use crate::onboarding::Phase;

/// The single `onboarding_workflow` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    pub current_phase: Phase,
    pub started_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub updated_by: Option<String>,
}

/// One recorded move of the workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub id: i64,
    pub from_phase: Phase,
    pub to_phase: Phase,
    pub actor_guid: String,
    pub actor_username: Option<String>,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(FromRow)]
struct WorkflowRow {
    current_phase: String,
    started_at: String,
    updated_at: String,
    completed_at: Option<String>,
    updated_by: Option<String>,
}

#[derive(FromRow)]
struct TransitionRow {
    id: i64,
    from_phase: String,
    to_phase: String,
    actor_guid: String,
    actor_username: Option<String>,
    note: Option<String>,
    created_at: String,
}

fn parse_phase(value: &str) -> Result<Phase> {
    Phase::parse(value).ok_or_else(|| Error::Internal(format!("Unknown onboarding phase: {}", value)))
}

pub async fn load_workflow(pool: &SqlitePool) -> Result<Workflow> {
    let row: Option<WorkflowRow> = sqlx::query_as(
        "SELECT current_phase, started_at, updated_at, completed_at, updated_by FROM onboarding_workflow WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;

    let row = row.ok_or_else(|| Error::NotFound("Onboarding workflow not initialized".to_string()))?;

    Ok(Workflow {
        current_phase: parse_phase(&row.current_phase)?,
        started_at: row.started_at,
        updated_at: row.updated_at,
        completed_at: row.completed_at,
        updated_by: row.updated_by,
    })
}

/// Transition history, oldest first
pub async fn list_transitions(pool: &SqlitePool) -> Result<Vec<TransitionRecord>> {
    let rows: Vec<TransitionRow> = sqlx::query_as(
        r#"
        SELECT t.id, t.from_phase, t.to_phase, t.actor_guid, u.username AS actor_username, t.note, t.created_at
        FROM onboarding_transitions t
        LEFT JOIN users u ON u.guid = t.actor_guid
        ORDER BY t.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(TransitionRecord {
                id: row.id,
                from_phase: parse_phase(&row.from_phase)?,
                to_phase: parse_phase(&row.to_phase)?,
                actor_guid: row.actor_guid,
                actor_username: row.actor_username,
                note: row.note,
                created_at: row.created_at,
            })
        })
        .collect()
}

/// Move the workflow from `from` to `to` and record it
///
/// Compare-and-set on `current_phase`: if the row is no longer in `from`
/// (another request moved it first) nothing is written and `Conflict` is
/// returned. The guard in `crate::onboarding` must already have passed.
pub async fn apply_transition(
    pool: &SqlitePool,
    from: Phase,
    to: Phase,
    actor_guid: &str,
    note: Option<&str>,
) -> Result<Workflow> {
    let now = time::now_rfc3339();
    let completed_at = (to == Phase::Completed).then(|| now.clone());

    let mut tx = pool.begin().await?;

    let affected = sqlx::query(
        r#"
        UPDATE onboarding_workflow
        SET current_phase = ?, updated_at = ?, completed_at = ?, updated_by = ?
        WHERE id = 1 AND current_phase = ?
        "#,
    )
    .bind(to.as_str())
    .bind(&now)
    .bind(&completed_at)
    .bind(actor_guid)
    .bind(from.as_str())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if affected == 0 {
        tx.rollback().await?;
        return Err(Error::Conflict(format!(
            "Onboarding workflow is no longer in the {} phase",
            from
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO onboarding_transitions (from_phase, to_phase, actor_guid, note, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(from.as_str())
    .bind(to.as_str())
    .bind(actor_guid)
    .bind(note)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Onboarding moved {} -> {} by {}", from, to, actor_guid);
    load_workflow(pool).await
}
