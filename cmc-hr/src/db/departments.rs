//! Departments

use cmc_common::api::Paginated;
use cmc_common::{time, Error, Result};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::like_pattern;
use crate::pagination::PageQuery;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Department {
    pub guid: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub employee_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Validated create/update input
#[derive(Debug, Clone)]
pub struct DepartmentInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

const SELECT_DEPARTMENT: &str = r#"
    SELECT d.guid, d.code, d.name, d.description,
           (SELECT COUNT(*) FROM employees e WHERE e.department_guid = d.guid) AS employee_count,
           d.created_at, d.updated_at
    FROM departments d
"#;

fn map_unique(err: sqlx::Error, input: &DepartmentInput) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Conflict(format!(
            "A department with code {} or name '{}' already exists",
            input.code, input.name
        )),
        _ => err.into(),
    }
}

pub async fn create_department(pool: &SqlitePool, input: &DepartmentInput) -> Result<Department> {
    let guid = Uuid::new_v4().to_string();
    let now = time::now_rfc3339();

    sqlx::query(
        "INSERT INTO departments (guid, code, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&input.code)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| map_unique(e, input))?;

    get_department(pool, &guid).await
}

pub async fn get_department(pool: &SqlitePool, guid: &str) -> Result<Department> {
    sqlx::query_as(&format!("{} WHERE d.guid = ?", SELECT_DEPARTMENT))
        .bind(guid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Department not found: {}", guid)))
}

pub async fn department_exists(pool: &SqlitePool, guid: &str) -> Result<bool> {
    let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM departments WHERE guid = ?)")
        .bind(guid)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// One page ordered by name, optionally filtered on name/code
pub async fn list_departments(
    pool: &SqlitePool,
    search: Option<&str>,
    page: &PageQuery,
) -> Result<Paginated<Department>> {
    let pattern = search.map(like_pattern);
    let filter = "WHERE (? IS NULL OR d.name LIKE ? ESCAPE '\\' OR d.code LIKE ? ESCAPE '\\')";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM departments d {}", filter))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;
    let pagination = page.paginate(total);

    let departments = sqlx::query_as(&format!(
        "{} {} ORDER BY d.name LIMIT ? OFFSET ?",
        SELECT_DEPARTMENT, filter
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(pagination.per_page)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    Ok(pagination.into_page(departments, total))
}

pub async fn update_department(
    pool: &SqlitePool,
    guid: &str,
    input: &DepartmentInput,
) -> Result<Department> {
    let affected = sqlx::query(
        "UPDATE departments SET code = ?, name = ?, description = ?, updated_at = ? WHERE guid = ?",
    )
    .bind(&input.code)
    .bind(&input.name)
    .bind(&input.description)
    .bind(time::now_rfc3339())
    .bind(guid)
    .execute(pool)
    .await
    .map_err(|e| map_unique(e, input))?
    .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("Department not found: {}", guid)));
    }

    get_department(pool, guid).await
}

/// Delete a department that no employee references
pub async fn delete_department(pool: &SqlitePool, guid: &str) -> Result<()> {
    let department = get_department(pool, guid).await?;
    if department.employee_count > 0 {
        return Err(Error::Conflict(format!(
            "Department {} still has {} employee(s)",
            department.code, department.employee_count
        )));
    }

    sqlx::query("DELETE FROM departments WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    fn input(code: &str, name: &str) -> DepartmentInput {
        DepartmentInput {
            code: code.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let (pool, _dir) = test_pool().await;

        let dept = create_department(&pool, &input("ACCT", "Accounting")).await.unwrap();
        assert_eq!(dept.employee_count, 0);

        let updated = update_department(&pool, &dept.guid, &input("FIN", "Finance")).await.unwrap();
        assert_eq!(updated.code, "FIN");
        assert_eq!(get_department(&pool, &dept.guid).await.unwrap().name, "Finance");
    }

    #[tokio::test]
    async fn test_duplicate_code_or_name_conflicts() {
        let (pool, _dir) = test_pool().await;
        create_department(&pool, &input("ACCT", "Accounting")).await.unwrap();

        let err = create_department(&pool, &input("ACCT", "Other")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let err = create_department(&pool, &input("ACC2", "accounting")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "names compare case-insensitively");
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let (pool, _dir) = test_pool().await;
        create_department(&pool, &input("ACCT", "Accounting")).await.unwrap();
        create_department(&pool, &input("PROD", "Production")).await.unwrap();
        create_department(&pool, &input("WH", "Warehouse")).await.unwrap();

        let all = list_departments(&pool, None, &PageQuery::default()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].name, "Accounting");

        let found = list_departments(&pool, Some("prod"), &PageQuery::default()).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].code, "PROD");

        let last = PageQuery { page: 9, per_page: 2 };
        let clamped = list_departments(&pool, None, &last).await.unwrap();
        assert_eq!(clamped.page, 2);
        assert_eq!(clamped.items.len(), 1);
        assert_eq!(clamped.items[0].name, "Warehouse");
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, _dir) = test_pool().await;
        let dept = create_department(&pool, &input("QA", "Quality Assurance")).await.unwrap();

        delete_department(&pool, &dept.guid).await.unwrap();
        assert!(!department_exists(&pool, &dept.guid).await.unwrap());
        assert!(matches!(
            delete_department(&pool, &dept.guid).await,
            Err(Error::NotFound(_))
        ));
    }
}
