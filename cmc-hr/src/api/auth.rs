//! Session authentication
//!
//! Clients log in with username/password and send the returned token as
//! `Authorization: Bearer <token>`. The middleware resolves it to a
//! [`CurrentUser`] request extension for downstream handlers.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use cmc_common::api::auth::{validate_password, verify_password, AuthError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::extract::ApiJson;
use crate::checklist::ChecklistSummary;
use crate::db::users::User;
use crate::db::{checklists, sessions, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated caller, inserted by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Missing, unknown or expired tokens and deactivated accounts get 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?
        .to_string();

    let user = match sessions::find_session_user(&state.db, &token).await? {
        Some(user) if user.active => user,
        Some(user) => {
            warn!("Rejected session of deactivated user {}", user.username);
            return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
        }
        None => {
            debug!("Rejected unknown or expired session token");
            return Err(ApiError::Unauthorized("Session expired or invalid".to_string()));
        }
    };

    request.extensions_mut().insert(CurrentUser { user, token });
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: User,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let purged = sessions::purge_expired(&state.db).await?;
    if purged > 0 {
        debug!("Purged {} expired session(s)", purged);
    }

    let creds = users::find_credentials_by_username(&state.db, &req.username).await?;
    let creds = match creds {
        Some(c) if verify_password(&req.password, &c.password_salt, &c.password_hash) => c,
        _ => {
            warn!("Failed login for '{}'", req.username.trim());
            return Err(ApiError::Unauthorized(AuthError::InvalidCredentials.to_string()));
        }
    };

    if !creds.user.active {
        warn!("Login attempt for deactivated user '{}'", creds.user.username);
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    let session =
        sessions::create_session(&state.db, &creds.user.guid, state.session_ttl_minutes).await?;
    info!("User {} logged in", creds.user.username);

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: creds.user,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<StatusResponse>> {
    sessions::delete_session(&state.db, &current.token).await?;
    info!("User {} logged out", current.user.username);
    Ok(Json(StatusResponse { status: "ok" }))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub checklist: ChecklistSummary,
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<MeResponse>> {
    let checklist = checklists::load_or_create(&state.db, &current.user).await?;
    Ok(Json(MeResponse {
        user: current.user,
        checklist: checklist.summary(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /api/auth/password
///
/// Other sessions of the user are revoked; the calling session stays valid.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MeResponse>> {
    let creds = users::get_credentials(&state.db, &current.user.guid).await?;
    if !verify_password(&req.current_password, &creds.password_salt, &creds.password_hash) {
        warn!("Wrong current password from {}", current.user.username);
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    validate_password(&req.new_password).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = users::set_password(&state.db, &current.user.guid, &req.new_password).await?;
    let revoked = sessions::delete_user_sessions(&state.db, &user.guid, Some(&current.token)).await?;
    info!(
        "User {} changed password ({} other session(s) revoked)",
        user.username, revoked
    );

    let checklist = checklists::load_or_create(&state.db, &user).await?;
    Ok(Json(MeResponse {
        user,
        checklist: checklist.summary(),
    }))
}
