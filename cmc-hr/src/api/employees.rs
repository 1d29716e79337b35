//! Employee endpoints (HR area)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use cmc_common::api::Paginated;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::auth::CurrentUser;
use super::extract::{ApiJson, ApiQuery};
use super::gates::{require, require_setup_phase};
use crate::db::departments::department_exists;
use crate::db::employees::{self, Employee, EmployeeFilter, EmployeeInput, EmploymentStatus};
use crate::error::{ApiError, ApiResult};
use crate::onboarding::Phase;
use crate::pagination::PageQuery;
use crate::roles::Permission;
use crate::validation::{self, optional_government_id, optional_text, FieldErrors, GovernmentId};
use crate::AppState;

/// Employee writes open once the HR manager owns setup
const SETUP_PHASE: Phase = Phase::HrManager;

#[derive(Debug, Deserialize)]
pub struct EmployeeSearch {
    pub search: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
}

/// Missing fields deserialize as blank so `validate` reports them per field
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmployeeRequest {
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub department_guid: Option<String>,
    pub position: Option<String>,
    pub employment_status: String,
    pub hire_date: String,
    pub monthly_salary_centavos: i64,
    pub sss_number: Option<String>,
    pub philhealth_number: Option<String>,
    pub pagibig_number: Option<String>,
    pub tin: Option<String>,
}

impl EmployeeRequest {
    /// Field-level validation; every problem is reported at once
    async fn validate(&self, pool: &SqlitePool) -> ApiResult<EmployeeInput> {
        let mut errors = FieldErrors::new();

        let employee_number = errors.check(
            "employee_number",
            validation::required(&self.employee_number, "Employee number"),
        );
        let first_name = errors.check("first_name", validation::required(&self.first_name, "First name"));
        let last_name = errors.check("last_name", validation::required(&self.last_name, "Last name"));

        let employment_status = errors.check(
            "employment_status",
            EmploymentStatus::parse(&self.employment_status).ok_or_else(|| {
                "Employment status must be probationary, regular, contractual or resigned"
                    .to_string()
            }),
        );
        let hire_date = errors.check("hire_date", validation::parse_date(&self.hire_date));

        if self.monthly_salary_centavos < 0 {
            errors.add("monthly_salary_centavos", "Monthly salary cannot be negative");
        }

        let department_guid = optional_text(self.department_guid.as_deref());
        if let Some(guid) = &department_guid {
            if !department_exists(pool, guid).await? {
                errors.add("department_guid", format!("Department not found: {}", guid));
            }
        }

        let sss_number =
            optional_government_id(&mut errors, "sss_number", GovernmentId::Sss, self.sss_number.as_deref());
        let philhealth_number = optional_government_id(
            &mut errors,
            "philhealth_number",
            GovernmentId::PhilHealth,
            self.philhealth_number.as_deref(),
        );
        let pagibig_number = optional_government_id(
            &mut errors,
            "pagibig_number",
            GovernmentId::PagIbig,
            self.pagibig_number.as_deref(),
        );
        let tin = optional_government_id(&mut errors, "tin", GovernmentId::Tin, self.tin.as_deref());

        errors.into_result()?;

        // into_result() succeeded, so every checked field is Some
        match (employee_number, first_name, last_name, employment_status, hire_date) {
            (
                Some(employee_number),
                Some(first_name),
                Some(last_name),
                Some(employment_status),
                Some(hire_date),
            ) => Ok(EmployeeInput {
                employee_number,
                first_name,
                last_name,
                department_guid,
                position: optional_text(self.position.as_deref()),
                employment_status,
                hire_date,
                monthly_salary_centavos: self.monthly_salary_centavos,
                sss_number,
                philhealth_number,
                pagibig_number,
                tin,
            }),
            _ => Err(ApiError::Internal(
                "Employee validation passed with missing fields".to_string(),
            )),
        }
    }
}

/// GET /api/employees
pub async fn list_employees(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiQuery(page): ApiQuery<PageQuery>,
    ApiQuery(search): ApiQuery<EmployeeSearch>,
) -> ApiResult<Json<Paginated<Employee>>> {
    require(&current.user, Permission::ViewEmployees)?;

    let mut errors = FieldErrors::new();
    let status = optional_text(search.status.as_deref()).and_then(|raw| {
        errors.check(
            "status",
            EmploymentStatus::parse(&raw).ok_or_else(|| format!("Unknown employment status: {}", raw)),
        )
    });
    errors.into_result()?;

    let filter = EmployeeFilter {
        search: optional_text(search.search.as_deref()),
        department_guid: optional_text(search.department.as_deref()),
        status,
    };

    Ok(Json(employees::list_employees(&state.db, &filter, &page).await?))
}

/// GET /api/employees/:guid
pub async fn get_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
) -> ApiResult<Json<Employee>> {
    require(&current.user, Permission::ViewEmployees)?;
    Ok(Json(employees::get_employee(&state.db, &guid).await?))
}

/// POST /api/employees
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(req): ApiJson<EmployeeRequest>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    require(&current.user, Permission::ManageEmployees)?;
    require_setup_phase(&state.db, &current.user, SETUP_PHASE).await?;

    let input = req.validate(&state.db).await?;
    let employee = employees::create_employee(&state.db, &input).await?;

    info!(
        "{} created employee {} ({} {})",
        current.user.username, employee.employee_number, employee.first_name, employee.last_name
    );
    Ok((StatusCode::CREATED, Json(employee)))
}

/// PUT /api/employees/:guid
pub async fn update_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
    ApiJson(req): ApiJson<EmployeeRequest>,
) -> ApiResult<Json<Employee>> {
    require(&current.user, Permission::ManageEmployees)?;
    require_setup_phase(&state.db, &current.user, SETUP_PHASE).await?;

    let input = req.validate(&state.db).await?;
    let employee = employees::update_employee(&state.db, &guid, &input).await?;

    info!("{} updated employee {}", current.user.username, employee.employee_number);
    Ok(Json(employee))
}

/// DELETE /api/employees/:guid
pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(guid): Path<String>,
) -> ApiResult<StatusCode> {
    require(&current.user, Permission::ManageEmployees)?;
    require_setup_phase(&state.db, &current.user, SETUP_PHASE).await?;

    employees::delete_employee(&state.db, &guid).await?;

    info!("{} deleted employee {}", current.user.username, guid);
    Ok(StatusCode::NO_CONTENT)
}
