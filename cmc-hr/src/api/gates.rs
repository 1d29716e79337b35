//! Access gates shared by handlers
//!
//! - [`require`]: role permission check (403)
//! - [`require_setup_phase`]: HR-area writes wait for the onboarding workflow (409)
//! - [`checklist_gate`]: middleware refusing callers with an incomplete checklist (403)

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;
use tracing::debug;

use super::auth::CurrentUser;
use crate::db::users::User;
use crate::db::{checklists, onboarding as workflow_db};
use crate::error::{ApiError, ApiResult};
use crate::onboarding::Phase;
use crate::roles::{Permission, Role};
use crate::AppState;

pub fn require(user: &User, permission: Permission) -> ApiResult<()> {
    if user.role.can(permission) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Role {} may not {:?}",
            user.role, permission
        )))
    }
}

/// Refuse unless the workflow has reached `required`; super_admin bypasses
pub async fn require_setup_phase(pool: &SqlitePool, actor: &User, required: Phase) -> ApiResult<()> {
    if actor.role == Role::SuperAdmin {
        return Ok(());
    }

    let current = workflow_db::load_workflow(pool).await?.current_phase;
    if current.reached(required) {
        Ok(())
    } else {
        Err(ApiError::SetupPhaseNotReached { required, current })
    }
}

/// Checklist gate middleware (layered inside `auth_middleware`)
pub async fn checklist_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    if current.user.role != Role::SuperAdmin {
        let checklist = checklists::load_or_create(&state.db, &current.user).await?;
        if !checklist.is_complete() {
            debug!(
                "Checklist gate refused {} ({}% complete)",
                current.user.username,
                checklist.percent_complete()
            );
            return Err(ApiError::ChecklistIncomplete(checklist.summary()));
        }
    }

    Ok(next.run(request).await)
}
