//! Employee records

use std::fmt;

use chrono::NaiveDate;
use cmc_common::api::Paginated;
use cmc_common::{time, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::like_pattern;
use crate::pagination::PageQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Probationary,
    Regular,
    Contractual,
    Resigned,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Probationary => "probationary",
            EmploymentStatus::Regular => "regular",
            EmploymentStatus::Contractual => "contractual",
            EmploymentStatus::Resigned => "resigned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "probationary" => Some(EmploymentStatus::Probationary),
            "regular" => Some(EmploymentStatus::Regular),
            "contractual" => Some(EmploymentStatus::Contractual),
            "resigned" => Some(EmploymentStatus::Resigned),
            _ => None,
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub guid: String,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub department_guid: Option<String>,
    pub department_name: Option<String>,
    pub position: Option<String>,
    pub employment_status: EmploymentStatus,
    pub hire_date: String,
    pub monthly_salary_centavos: i64,
    pub sss_number: Option<String>,
    pub philhealth_number: Option<String>,
    pub pagibig_number: Option<String>,
    pub tin: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Validated employee fields; government IDs already normalized to digits
#[derive(Debug, Clone)]
pub struct EmployeeInput {
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub department_guid: Option<String>,
    pub position: Option<String>,
    pub employment_status: EmploymentStatus,
    pub hire_date: NaiveDate,
    pub monthly_salary_centavos: i64,
    pub sss_number: Option<String>,
    pub philhealth_number: Option<String>,
    pub pagibig_number: Option<String>,
    pub tin: Option<String>,
}

/// Listing filters
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub department_guid: Option<String>,
    pub status: Option<EmploymentStatus>,
}

#[derive(FromRow)]
struct EmployeeRow {
    guid: String,
    employee_number: String,
    first_name: String,
    last_name: String,
    department_guid: Option<String>,
    department_name: Option<String>,
    position: Option<String>,
    employment_status: String,
    hire_date: String,
    monthly_salary_centavos: i64,
    sss_number: Option<String>,
    philhealth_number: Option<String>,
    pagibig_number: Option<String>,
    tin: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = Error;

    fn try_from(row: EmployeeRow) -> Result<Self> {
        let employment_status = EmploymentStatus::parse(&row.employment_status).ok_or_else(|| {
            Error::Internal(format!(
                "Employee {} has unknown status {}",
                row.guid, row.employment_status
            ))
        })?;

        Ok(Employee {
            guid: row.guid,
            employee_number: row.employee_number,
            first_name: row.first_name,
            last_name: row.last_name,
            department_guid: row.department_guid,
            department_name: row.department_name,
            position: row.position,
            employment_status,
            hire_date: row.hire_date,
            monthly_salary_centavos: row.monthly_salary_centavos,
            sss_number: row.sss_number,
            philhealth_number: row.philhealth_number,
            pagibig_number: row.pagibig_number,
            tin: row.tin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_EMPLOYEE: &str = r#"
    SELECT e.guid, e.employee_number, e.first_name, e.last_name, e.department_guid,
           d.name AS department_name, e.position, e.employment_status, e.hire_date,
           e.monthly_salary_centavos, e.sss_number, e.philhealth_number, e.pagibig_number,
           e.tin, e.created_at, e.updated_at
    FROM employees e
    LEFT JOIN departments d ON d.guid = e.department_guid
"#;

const FILTER: &str = r#"
    WHERE (? IS NULL OR e.employee_number LIKE ? ESCAPE '\' OR e.first_name LIKE ? ESCAPE '\'
           OR e.last_name LIKE ? ESCAPE '\')
      AND (? IS NULL OR e.department_guid = ?)
      AND (? IS NULL OR e.employment_status = ?)
"#;

fn map_write_error(err: sqlx::Error, input: &EmployeeInput) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Conflict(format!(
            "Employee number already in use: {}",
            input.employee_number
        )),
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => Error::NotFound(
            format!(
                "Department not found: {}",
                input.department_guid.as_deref().unwrap_or_default()
            ),
        ),
        _ => err.into(),
    }
}

pub async fn create_employee(pool: &SqlitePool, input: &EmployeeInput) -> Result<Employee> {
    let guid = Uuid::new_v4().to_string();
    let now = time::now_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO employees (
            guid, employee_number, first_name, last_name, department_guid, position,
            employment_status, hire_date, monthly_salary_centavos,
            sss_number, philhealth_number, pagibig_number, tin, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&input.employee_number)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.department_guid)
    .bind(&input.position)
    .bind(input.employment_status.as_str())
    .bind(input.hire_date.format("%Y-%m-%d").to_string())
    .bind(input.monthly_salary_centavos)
    .bind(&input.sss_number)
    .bind(&input.philhealth_number)
    .bind(&input.pagibig_number)
    .bind(&input.tin)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, input))?;

    get_employee(pool, &guid).await
}

pub async fn get_employee(pool: &SqlitePool, guid: &str) -> Result<Employee> {
    let row: Option<EmployeeRow> = sqlx::query_as(&format!("{} WHERE e.guid = ?", SELECT_EMPLOYEE))
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    row.map(Employee::try_from)
        .transpose()?
        .ok_or_else(|| Error::NotFound(format!("Employee not found: {}", guid)))
}

/// One page ordered by last then first name, with the filtered total
pub async fn list_employees(
    pool: &SqlitePool,
    filter: &EmployeeFilter,
    page: &PageQuery,
) -> Result<Paginated<Employee>> {
    let pattern = filter.search.as_deref().map(like_pattern);
    let department = filter.department_guid.as_deref();
    let status = filter.status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM employees e {}", FILTER))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(department)
        .bind(department)
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await?;
    let pagination = page.paginate(total);

    let rows: Vec<EmployeeRow> = sqlx::query_as(&format!(
        "{} {} ORDER BY e.last_name, e.first_name, e.employee_number LIMIT ? OFFSET ?",
        SELECT_EMPLOYEE, FILTER
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(department)
    .bind(department)
    .bind(status)
    .bind(status)
    .bind(pagination.per_page)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    let employees = rows
        .into_iter()
        .map(Employee::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(pagination.into_page(employees, total))
}

pub async fn update_employee(pool: &SqlitePool, guid: &str, input: &EmployeeInput) -> Result<Employee> {
    let affected = sqlx::query(
        r#"
        UPDATE employees
        SET employee_number = ?, first_name = ?, last_name = ?, department_guid = ?, position = ?,
            employment_status = ?, hire_date = ?, monthly_salary_centavos = ?,
            sss_number = ?, philhealth_number = ?, pagibig_number = ?, tin = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&input.employee_number)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&input.department_guid)
    .bind(&input.position)
    .bind(input.employment_status.as_str())
    .bind(input.hire_date.format("%Y-%m-%d").to_string())
    .bind(input.monthly_salary_centavos)
    .bind(&input.sss_number)
    .bind(&input.philhealth_number)
    .bind(&input.pagibig_number)
    .bind(&input.tin)
    .bind(time::now_rfc3339())
    .bind(guid)
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, input))?
    .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("Employee not found: {}", guid)));
    }

    get_employee(pool, guid).await
}

pub async fn delete_employee(pool: &SqlitePool, guid: &str) -> Result<()> {
    let affected = sqlx::query("DELETE FROM employees WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("Employee not found: {}", guid)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::departments::{create_department, delete_department, DepartmentInput};
    use crate::db::test_support::test_pool;

    fn input(number: &str, first: &str, last: &str) -> EmployeeInput {
        EmployeeInput {
            employee_number: number.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            department_guid: None,
            position: Some("Welder".to_string()),
            employment_status: EmploymentStatus::Probationary,
            hire_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            monthly_salary_centavos: 2_500_000,
            sss_number: Some("3412345678".to_string()),
            philhealth_number: None,
            pagibig_number: None,
            tin: None,
        }
    }

    async fn department(pool: &SqlitePool, code: &str, name: &str) -> String {
        create_department(
            pool,
            &DepartmentInput {
                code: code.to_string(),
                name: name.to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
        .guid
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(EmploymentStatus::parse("Regular"), Some(EmploymentStatus::Regular));
        assert_eq!(EmploymentStatus::parse("intern"), None);
        assert_eq!(EmploymentStatus::Contractual.to_string(), "contractual");
    }

    #[tokio::test]
    async fn test_create_with_department() {
        let (pool, _dir) = test_pool().await;
        let dept = department(&pool, "PROD", "Production").await;

        let mut new = input("E-0001", "Juan", "Dela Cruz");
        new.department_guid = Some(dept.clone());
        let employee = create_employee(&pool, &new).await.unwrap();

        assert_eq!(employee.department_name.as_deref(), Some("Production"));
        assert_eq!(employee.hire_date, "2024-03-01");
        assert_eq!(employee.employment_status, EmploymentStatus::Probationary);
    }

    #[tokio::test]
    async fn test_unknown_department_is_not_found() {
        let (pool, _dir) = test_pool().await;

        let mut new = input("E-0001", "Juan", "Dela Cruz");
        new.department_guid = Some("missing".to_string());
        let err = create_employee(&pool, &new).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_duplicate_employee_number() {
        let (pool, _dir) = test_pool().await;
        create_employee(&pool, &input("E-0001", "Juan", "Dela Cruz")).await.unwrap();

        let err = create_employee(&pool, &input("E-0001", "Maria", "Santos")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (pool, _dir) = test_pool().await;
        let prod = department(&pool, "PROD", "Production").await;

        let mut juan = input("E-0001", "Juan", "Dela Cruz");
        juan.department_guid = Some(prod.clone());
        create_employee(&pool, &juan).await.unwrap();

        let mut maria = input("E-0002", "Maria", "Santos");
        maria.employment_status = EmploymentStatus::Regular;
        create_employee(&pool, &maria).await.unwrap();

        let all = list_employees(&pool, &EmployeeFilter::default(), &PageQuery::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let by_dept = EmployeeFilter {
            department_guid: Some(prod),
            ..Default::default()
        };
        let found = list_employees(&pool, &by_dept, &PageQuery::default()).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].first_name, "Juan");

        let by_status = EmployeeFilter {
            status: Some(EmploymentStatus::Regular),
            ..Default::default()
        };
        let found = list_employees(&pool, &by_status, &PageQuery::default()).await.unwrap();
        assert_eq!(found.items[0].last_name, "Santos");

        let by_search = EmployeeFilter {
            search: Some("sant".to_string()),
            ..Default::default()
        };
        let found = list_employees(&pool, &by_search, &PageQuery::default()).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].employee_number, "E-0002");
    }

    #[tokio::test]
    async fn test_department_with_employees_cannot_be_deleted() {
        let (pool, _dir) = test_pool().await;
        let prod = department(&pool, "PROD", "Production").await;

        let mut juan = input("E-0001", "Juan", "Dela Cruz");
        juan.department_guid = Some(prod.clone());
        let employee = create_employee(&pool, &juan).await.unwrap();

        assert!(matches!(delete_department(&pool, &prod).await, Err(Error::Conflict(_))));

        delete_employee(&pool, &employee.guid).await.unwrap();
        delete_department(&pool, &prod).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_employee() {
        let (pool, _dir) = test_pool().await;
        let employee = create_employee(&pool, &input("E-0001", "Juan", "Dela Cruz")).await.unwrap();

        let mut changed = input("E-0001", "Juan", "Dela Cruz");
        changed.employment_status = EmploymentStatus::Regular;
        changed.monthly_salary_centavos = 3_000_000;
        let updated = update_employee(&pool, &employee.guid, &changed).await.unwrap();

        assert_eq!(updated.employment_status, EmploymentStatus::Regular);
        assert_eq!(updated.monthly_salary_centavos, 3_000_000);
        assert!(matches!(
            update_employee(&pool, "missing", &changed).await,
            Err(Error::NotFound(_))
        ));
    }
}
