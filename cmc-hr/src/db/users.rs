//! User accounts

use cmc_common::api::auth::{generate_password, generate_salt, hash_password};
use cmc_common::api::Paginated;
use cmc_common::{time, Error, Result};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::checklist::ProfileFields;
use crate::pagination::PageQuery;
use crate::roles::Role;

/// User account as exposed by the API (no credential columns)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub guid: String,
    pub username: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub active: bool,
    pub password_changed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn profile_fields(&self) -> ProfileFields {
        ProfileFields {
            full_name: self.full_name.clone(),
            contact_number: self.contact_number.clone(),
            address: self.address.clone(),
            emergency_contact: self.emergency_contact.clone(),
            password_changed: self.password_changed_at.is_some(),
        }
    }
}

/// User plus stored credential columns
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
    pub password_salt: String,
}

#[derive(FromRow)]
struct UserRow {
    guid: String,
    username: String,
    password_hash: String,
    password_salt: String,
    role: String,
    full_name: Option<String>,
    contact_number: Option<String>,
    address: Option<String>,
    emergency_contact: Option<String>,
    active: bool,
    password_changed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for Credentials {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = Role::parse(&row.role)
            .map_err(|_| Error::Internal(format!("User {} has unknown role {}", row.guid, row.role)))?;

        Ok(Credentials {
            user: User {
                guid: row.guid,
                username: row.username,
                role,
                full_name: row.full_name,
                contact_number: row.contact_number,
                address: row.address,
                emergency_contact: row.emergency_contact,
                active: row.active,
                password_changed_at: row.password_changed_at,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
            password_salt: row.password_salt,
        })
    }
}

pub(crate) const USER_COLUMNS: &str = "guid, username, password_hash, password_salt, role, full_name, \
     contact_number, address, emergency_contact, active, password_changed_at, created_at, updated_at";

/// Input for [`create_user`]; username and password already validated
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub full_name: Option<String>,
}

/// Editable profile fields
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

pub async fn create_user(pool: &SqlitePool, new_user: NewUser) -> Result<User> {
    let guid = Uuid::new_v4().to_string();
    let salt = generate_salt();
    let hash = hash_password(&new_user.password, &salt);
    let now = time::now_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO users (guid, username, password_hash, password_salt, role, full_name, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&new_user.username)
    .bind(&hash)
    .bind(&salt)
    .bind(new_user.role.as_str())
    .bind(&new_user.full_name)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(Error::Conflict(format!(
                "Username already taken: {}",
                new_user.username
            )));
        }
        Err(e) => return Err(e.into()),
    }

    info!("Created user {} ({})", new_user.username, new_user.role);
    get_user(pool, &guid).await
}

pub async fn get_user(pool: &SqlitePool, guid: &str) -> Result<User> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS))
            .bind(guid)
            .fetch_optional(pool)
            .await?;

    row.map(|r| Credentials::try_from(r).map(|c| c.user))
        .transpose()?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", guid)))
}

pub async fn find_credentials_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<Credentials>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
            .bind(username.trim())
            .fetch_optional(pool)
            .await?;

    row.map(Credentials::try_from).transpose()
}

pub async fn get_credentials(pool: &SqlitePool, guid: &str) -> Result<Credentials> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS))
            .bind(guid)
            .fetch_optional(pool)
            .await?;

    row.map(Credentials::try_from)
        .transpose()?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", guid)))
}

/// One page of users ordered by username
pub async fn list_users(
    pool: &SqlitePool,
    role: Option<Role>,
    page: &PageQuery,
) -> Result<Paginated<User>> {
    let role = role.map(|r| r.as_str());

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE (? IS NULL OR role = ?)")
        .bind(role)
        .bind(role)
        .fetch_one(pool)
        .await?;
    let pagination = page.paginate(total);

    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE (? IS NULL OR role = ?) ORDER BY username LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(role)
    .bind(role)
    .bind(pagination.per_page)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    let users = rows
        .into_iter()
        .map(|r| Credentials::try_from(r).map(|c| c.user))
        .collect::<Result<Vec<_>>>()?;

    Ok(pagination.into_page(users, total))
}

pub async fn update_profile(pool: &SqlitePool, guid: &str, update: &ProfileUpdate) -> Result<User> {
    let affected = sqlx::query(
        r#"
        UPDATE users
        SET full_name = ?, contact_number = ?, address = ?, emergency_contact = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&update.full_name)
    .bind(&update.contact_number)
    .bind(&update.address)
    .bind(&update.emergency_contact)
    .bind(time::now_rfc3339())
    .bind(guid)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("User not found: {}", guid)));
    }

    get_user(pool, guid).await
}

/// Store a new password and stamp `password_changed_at`
pub async fn set_password(pool: &SqlitePool, guid: &str, password: &str) -> Result<User> {
    let salt = generate_salt();
    let hash = hash_password(password, &salt);
    let now = time::now_rfc3339();

    let affected = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?, password_salt = ?, password_changed_at = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&hash)
    .bind(&salt)
    .bind(&now)
    .bind(&now)
    .bind(guid)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("User not found: {}", guid)));
    }

    get_user(pool, guid).await
}

/// Matches unless the row is the last active super admin
///
/// Evaluated inside the UPDATE so concurrent demotions cannot both pass.
const KEEPS_A_SUPER_ADMIN: &str = "(NOT (role = 'super_admin' AND active = 1) \
     OR (SELECT COUNT(*) FROM users WHERE role = 'super_admin' AND active = 1) > 1)";

/// Message for refusing to demote or deactivate the last super admin
pub const LAST_SUPER_ADMIN: &str = "At least one active super admin must remain";

/// Turn a zero-row guarded update into NotFound or Conflict
async fn guarded_result(pool: &SqlitePool, guid: &str, affected: u64) -> Result<User> {
    let user = get_user(pool, guid).await?;
    if affected == 0 {
        return Err(Error::Conflict(LAST_SUPER_ADMIN.to_string()));
    }
    Ok(user)
}

/// Change a user's role
///
/// Demoting the last active super admin fails with `Conflict`.
pub async fn set_role(pool: &SqlitePool, guid: &str, role: Role) -> Result<User> {
    let sql = if role == Role::SuperAdmin {
        "UPDATE users SET role = ?, updated_at = ? WHERE guid = ?".to_string()
    } else {
        format!(
            "UPDATE users SET role = ?, updated_at = ? WHERE guid = ? AND {}",
            KEEPS_A_SUPER_ADMIN
        )
    };

    let affected = sqlx::query(&sql)
        .bind(role.as_str())
        .bind(time::now_rfc3339())
        .bind(guid)
        .execute(pool)
        .await?
        .rows_affected();

    let user = guarded_result(pool, guid, affected).await?;
    info!("User {} is now {}", guid, role);
    Ok(user)
}

/// Activate or deactivate a user
///
/// Deactivating the last active super admin fails with `Conflict`.
pub async fn set_active(pool: &SqlitePool, guid: &str, active: bool) -> Result<User> {
    let sql = if active {
        "UPDATE users SET active = ?, updated_at = ? WHERE guid = ?".to_string()
    } else {
        format!(
            "UPDATE users SET active = ?, updated_at = ? WHERE guid = ? AND {}",
            KEEPS_A_SUPER_ADMIN
        )
    };

    let affected = sqlx::query(&sql)
        .bind(active)
        .bind(time::now_rfc3339())
        .bind(guid)
        .execute(pool)
        .await?
        .rows_affected();

    guarded_result(pool, guid, affected).await
}

pub async fn count_active_super_admins(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE role = 'super_admin' AND active = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Account created (or restored) by [`ensure_bootstrap_admin`]
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    /// Set when no password was configured and one was generated
    pub generated_password: Option<String>,
    /// An existing `admin` account was re-activated instead of created
    pub restored: bool,
}

/// Username of the bootstrap super admin
pub const BOOTSTRAP_USERNAME: &str = "admin";

/// Guarantee at least one active super admin exists
///
/// When none does, the `admin` account is created (or re-activated and
/// promoted if the name is taken) with `password`, or a generated one.
pub async fn ensure_bootstrap_admin(
    pool: &SqlitePool,
    password: Option<&str>,
) -> Result<Option<BootstrapAdmin>> {
    if count_active_super_admins(pool).await? > 0 {
        return Ok(None);
    }

    let generated_password = match password {
        Some(_) => None,
        None => Some(generate_password()),
    };
    let password = password
        .map(str::to_string)
        .or_else(|| generated_password.clone())
        .ok_or_else(|| Error::Internal("No bootstrap password available".to_string()))?;

    let restored = match find_credentials_by_username(pool, BOOTSTRAP_USERNAME).await? {
        Some(existing) => {
            warn!(
                "No active super admin; restoring '{}' as super admin",
                BOOTSTRAP_USERNAME
            );
            let guid = existing.user.guid;
            set_role(pool, &guid, Role::SuperAdmin).await?;
            set_active(pool, &guid, true).await?;

            // Bootstrap password counts as temporary
            let salt = generate_salt();
            sqlx::query(
                "UPDATE users SET password_hash = ?, password_salt = ?, password_changed_at = NULL WHERE guid = ?",
            )
            .bind(hash_password(&password, &salt))
            .bind(&salt)
            .bind(&guid)
            .execute(pool)
            .await?;
            true
        }
        None => {
            create_user(
                pool,
                NewUser {
                    username: BOOTSTRAP_USERNAME.to_string(),
                    password,
                    role: Role::SuperAdmin,
                    full_name: None,
                },
            )
            .await?;
            false
        }
    };

    Ok(Some(BootstrapAdmin {
        username: BOOTSTRAP_USERNAME.to_string(),
        generated_password,
        restored,
    }))
}
