//! User management and own-profile endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use cmc_common::api::auth::validate_password;
use cmc_common::api::Paginated;
use serde::Deserialize;
use tracing::info;

use super::auth::{CurrentUser, MeResponse};
use super::extract::{ApiJson, ApiQuery};
use super::gates::require;
use crate::db::users::{NewUser, ProfileUpdate, User};
use crate::db::{checklists, sessions, users};
use crate::error::{ApiError, ApiResult};
use crate::pagination::PageQuery;
use crate::roles::{Permission, Role};
use crate::validation::{self, optional_text, FieldErrors};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub role: Option<String>,
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiQuery(page): ApiQuery<PageQuery>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<Json<Paginated<User>>> {
    require(&current.user, Permission::ManageUsers)?;

    let role = optional_text(filter.role.as_deref())
        .map(|r| Role::parse(&r))
        .transpose()?;

    Ok(Json(users::list_users(&state.db, role, &page).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub full_name: Option<String>,
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require(&current.user, Permission::ManageUsers)?;
    if !current.user.role.can_assign(req.role) {
        return Err(ApiError::Forbidden(format!(
            "Role {} may not create {} accounts",
            current.user.role, req.role
        )));
    }

    let mut errors = FieldErrors::new();
    let username = errors.check("username", validation::username(&req.username));
    errors.check(
        "password",
        validate_password(&req.password).map_err(|e| e.to_string()),
    );
    errors.into_result()?;

    let user = users::create_user(
        &state.db,
        NewUser {
            username: username.unwrap_or_default(),
            password: req.password,
            role: req.role,
            full_name: optional_text(req.full_name.as_deref()),
        },
    )
    .await?;
    checklists::load_or_create(&state.db, &user).await?;

    info!("{} created user {} ({})", current.user.username, user.username, user.role);
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/:guid
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
) -> ApiResult<Json<User>> {
    require(&current.user, Permission::ManageUsers)?;
    Ok(Json(users::get_user(&state.db, &guid).await?))
}

/// Actor may manage `target` only if it could have granted the target's role
fn ensure_can_manage(actor: &User, target: &User) -> ApiResult<()> {
    if actor.guid == target.guid {
        return Err(ApiError::Forbidden(
            "You cannot change your own account this way".to_string(),
        ));
    }
    if !actor.role.can_assign(target.role) {
        return Err(ApiError::Forbidden(format!(
            "Role {} may not manage {} accounts",
            actor.role, target.role
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// PUT /api/users/:guid/role
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
    ApiJson(req): ApiJson<UpdateRoleRequest>,
) -> ApiResult<Json<User>> {
    require(&current.user, Permission::ManageUsers)?;

    let target = users::get_user(&state.db, &guid).await?;
    ensure_can_manage(&current.user, &target)?;
    if !current.user.role.can_assign(req.role) {
        return Err(ApiError::Forbidden(format!(
            "Role {} may not assign {}",
            current.user.role, req.role
        )));
    }
    if target.role == req.role {
        return Ok(Json(target));
    }

    let user = users::set_role(&state.db, &guid, req.role).await?;
    checklists::load_or_create(&state.db, &user).await?;

    info!(
        "{} changed role of {} from {} to {}",
        current.user.username, user.username, target.role, user.role
    );
    Ok(Json(user))
}

/// POST /api/users/:guid/deactivate
///
/// Also revokes every session of the user.
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
) -> ApiResult<Json<User>> {
    require(&current.user, Permission::ManageUsers)?;

    let target = users::get_user(&state.db, &guid).await?;
    ensure_can_manage(&current.user, &target)?;
    if !target.active {
        return Ok(Json(target));
    }

    let user = users::set_active(&state.db, &guid, false).await?;
    let revoked = sessions::delete_user_sessions(&state.db, &guid, None).await?;

    info!(
        "{} deactivated {} ({} session(s) revoked)",
        current.user.username, user.username, revoked
    );
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub full_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

/// PUT /api/profile
///
/// Replaces the caller's profile fields and re-syncs their checklist.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> ApiResult<Json<MeResponse>> {
    let update = ProfileUpdate {
        full_name: optional_text(req.full_name.as_deref()),
        contact_number: optional_text(req.contact_number.as_deref()),
        address: optional_text(req.address.as_deref()),
        emergency_contact: optional_text(req.emergency_contact.as_deref()),
    };

    let user = users::update_profile(&state.db, &current.user.guid, &update).await?;
    let checklist = checklists::load_or_create(&state.db, &user).await?;

    Ok(Json(MeResponse {
        user,
        checklist: checklist.summary(),
    }))
}
