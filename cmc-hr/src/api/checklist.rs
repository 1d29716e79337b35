//! Onboarding checklist endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use super::auth::CurrentUser;
use super::extract::ApiJson;
use super::gates::require;
use crate::checklist::ChecklistSummary;
use crate::db::{checklists, users};
use crate::error::ApiResult;
use crate::roles::Permission;
use crate::AppState;

/// GET /api/checklist
pub async fn get_own_checklist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ChecklistSummary>> {
    let checklist = checklists::load_or_create(&state.db, &current.user).await?;
    Ok(Json(checklist.summary()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub done: bool,
}

/// PUT /api/checklist/:key
///
/// Only manual items; profile-backed ones follow the profile.
pub async fn update_checklist_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(key): Path<String>,
    ApiJson(req): ApiJson<UpdateItemRequest>,
) -> ApiResult<Json<ChecklistSummary>> {
    let mut checklist = checklists::load_or_create(&state.db, &current.user).await?;

    if checklist.mark(&key, req.done)? {
        checklists::save(&state.db, &current.user.guid, &checklist).await?;
        info!(
            "{} marked checklist item {} as {}",
            current.user.username,
            key,
            if req.done { "done" } else { "not done" }
        );
    }

    Ok(Json(checklist.summary()))
}

/// GET /api/users/:guid/checklist
pub async fn get_user_checklist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
) -> ApiResult<Json<ChecklistSummary>> {
    require(&current.user, Permission::ManageUsers)?;

    let user = users::get_user(&state.db, &guid).await?;
    let checklist = checklists::load_or_create(&state.db, &user).await?;
    Ok(Json(checklist.summary()))
}
