//! Organization settings endpoints

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use tracing::info;

use super::auth::CurrentUser;
use super::extract::ApiJson;
use super::gates::require;
use crate::db::settings::{self, OrganizationSettings, PayrollFrequency};
use crate::error::ApiResult;
use crate::roles::Permission;
use crate::validation::{self, FieldErrors};
use crate::AppState;

/// GET /api/organization
pub async fn get_organization(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
) -> ApiResult<Json<OrganizationSettings>> {
    Ok(Json(settings::load_organization(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct OrganizationRequest {
    pub organization_name: String,
    #[serde(default)]
    pub organization_address: String,
    pub payroll_frequency: String,
}

/// PUT /api/organization
pub async fn update_organization(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<OrganizationRequest>,
) -> ApiResult<Json<OrganizationSettings>> {
    require(&current.user, Permission::ManageOrganization)?;

    let mut errors = FieldErrors::new();
    let name = errors.check(
        "organization_name",
        validation::required(&req.organization_name, "Organization name"),
    );
    let frequency = errors.check(
        "payroll_frequency",
        req.payroll_frequency.parse::<PayrollFrequency>(),
    );
    errors.into_result()?;

    let updated = OrganizationSettings {
        organization_name: name.unwrap_or_default(),
        organization_address: req.organization_address.trim().to_string(),
        payroll_frequency: frequency.unwrap_or_default(),
    };
    settings::save_organization(&state.db, &updated).await?;

    info!(
        "{} updated organization settings ({}, {})",
        current.user.username, updated.organization_name, updated.payroll_frequency
    );
    Ok(Json(updated))
}
