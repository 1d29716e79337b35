//! Department endpoints (HR area)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use cmc_common::api::Paginated;
use serde::Deserialize;
use tracing::info;

use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiQuery};
use super::gates::{require, require_setup_phase};
use crate::db::departments::{self, Department, DepartmentInput};
use crate::error::ApiResult;
use crate::onboarding::Phase;
use crate::pagination::PageQuery;
use crate::roles::Permission;
use crate::validation::{self, optional_text, FieldErrors};
use crate::AppState;

/// Department writes open once the office admin owns setup
const SETUP_PHASE: Phase = Phase::OfficeAdmin;

#[derive(Debug, Deserialize)]
pub struct DepartmentSearch {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

impl DepartmentRequest {
    fn validate(&self) -> ApiResult<DepartmentInput> {
        let mut errors = FieldErrors::new();
        let code = errors.check("code", validation::department_code(&self.code));
        let name = errors.check("name", validation::required(&self.name, "Department name"));
        errors.into_result()?;

        Ok(DepartmentInput {
            code: code.unwrap_or_default(),
            name: name.unwrap_or_default(),
            description: optional_text(self.description.as_deref()),
        })
    }
}

/// GET /api/departments
pub async fn list_departments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiQuery(page): ApiQuery<PageQuery>,
    ApiQuery(filter): ApiQuery<DepartmentSearch>,
) -> ApiResult<Json<Paginated<Department>>> {
    require(&current.user, Permission::ManageDepartments)?;

    let search = optional_text(filter.search.as_deref());
    Ok(Json(
        departments::list_departments(&state.db, search.as_deref(), &page).await?,
    ))
}

/// GET /api/departments/:guid
pub async fn get_department(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
) -> ApiResult<Json<Department>> {
    require(&current.user, Permission::ManageDepartments)?;
    Ok(Json(departments::get_department(&state.db, &guid).await?))
}

/// POST /api/departments
pub async fn create_department(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<DepartmentRequest>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    require(&current.user, Permission::ManageDepartments)?;
    require_setup_phase(&state.db, &current.user, SETUP_PHASE).await?;

    let input = req.validate()?;
    let department = departments::create_department(&state.db, &input).await?;

    info!("{} created department {}", current.user.username, department.code);
    Ok((StatusCode::CREATED, Json(department)))
}

/// PUT /api/departments/:guid
pub async fn update_department(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
    ApiJson(req): ApiJson<DepartmentRequest>,
) -> ApiResult<Json<Department>> {
    require(&current.user, Permission::ManageDepartments)?;
    require_setup_phase(&state.db, &current.user, SETUP_PHASE).await?;

    let input = req.validate()?;
    let department = departments::update_department(&state.db, &guid, &input).await?;

    info!("{} updated department {}", current.user.username, department.code);
    Ok(Json(department))
}

/// DELETE /api/departments/:guid
pub async fn delete_department(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
) -> ApiResult<StatusCode> {
    require(&current.user, Permission::ManageDepartments)?;
    require_setup_phase(&state.db, &current.user, SETUP_PHASE).await?;

    departments::delete_department(&state.db, &guid).await?;

    info!("{} deleted department {}", current.user.username, guid);
    Ok(StatusCode::NO_CONTENT)
}
