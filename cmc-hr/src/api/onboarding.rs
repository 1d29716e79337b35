//! Onboarding workflow endpoints

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use super::auth::CurrentUser;
use super::extract::ApiJson;
use crate::db::onboarding::{self as workflow_db, TransitionRecord, Workflow};
use crate::error::ApiResult;
use crate::onboarding::{check_reset, check_transition, Phase};
use crate::roles::Role;
use crate::validation::optional_text;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OnboardingStatus {
    pub current_phase: Phase,
    pub next_phase: Option<Phase>,
    /// Role expected to act in the current phase
    pub owner: Option<Role>,
    pub progress_percent: u8,
    /// Whether the caller may advance the workflow right now
    pub can_advance: bool,
    pub started_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub updated_by: Option<String>,
    pub history: Vec<TransitionRecord>,
}

async fn status_for(state: &AppState, workflow: Workflow, actor: Role) -> ApiResult<OnboardingStatus> {
    let history = workflow_db::list_transitions(&state.db).await?;
    let phase = workflow.current_phase;
    let can_advance = phase
        .next()
        .is_some_and(|next| check_transition(phase, next, actor).is_ok());

    Ok(OnboardingStatus {
        current_phase: phase,
        next_phase: phase.next(),
        owner: phase.owner(),
        progress_percent: phase.progress_percent(),
        can_advance,
        started_at: workflow.started_at,
        updated_at: workflow.updated_at,
        completed_at: workflow.completed_at,
        updated_by: workflow.updated_by,
        history,
    })
}

/// GET /api/onboarding
pub async fn get_onboarding_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<OnboardingStatus>> {
    let workflow = workflow_db::load_workflow(&state.db).await?;
    Ok(Json(status_for(&state, workflow, current.user.role).await?))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub to: Phase,
    pub note: Option<String>,
}

/// POST /api/onboarding/transition
pub async fn transition_onboarding(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<TransitionRequest>,
) -> ApiResult<Json<OnboardingStatus>> {
    let from = workflow_db::load_workflow(&state.db).await?.current_phase;
    check_transition(from, req.to, current.user.role)?;

    let note = optional_text(req.note.as_deref());
    let workflow =
        workflow_db::apply_transition(&state.db, from, req.to, &current.user.guid, note.as_deref())
            .await?;

    Ok(Json(status_for(&state, workflow, current.user.role).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    pub note: Option<String>,
}

/// POST /api/onboarding/reset
///
/// The body is optional; a request without one resets with no note.
pub async fn reset_onboarding(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    body: Option<ApiJson<ResetRequest>>,
) -> ApiResult<Json<OnboardingStatus>> {
    let ApiJson(req) = body.unwrap_or_default();
    let from = workflow_db::load_workflow(&state.db).await?.current_phase;
    check_reset(from, current.user.role)?;

    let note = optional_text(req.note.as_deref());
    let workflow = workflow_db::apply_transition(
        &state.db,
        from,
        Phase::SuperAdmin,
        &current.user.guid,
        note.as_deref(),
    )
    .await?;

    Ok(Json(status_for(&state, workflow, current.user.role).await?))
}
