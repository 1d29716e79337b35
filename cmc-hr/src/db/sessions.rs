//! Bearer session tokens
//!
//! Expiry timestamps are RFC 3339 UTC strings, so comparing them as text in
//! SQL orders them correctly.

use cmc_common::api::auth::generate_session_token;
use cmc_common::{time, Result};
use serde::Serialize;
use sqlx::SqlitePool;

use super::users::{Credentials, User};

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: String,
}

pub async fn create_session(pool: &SqlitePool, user_guid: &str, ttl_minutes: i64) -> Result<Session> {
    let session = Session {
        token: generate_session_token(),
        expires_at: time::minutes_from_now(ttl_minutes),
    };

    sqlx::query("INSERT INTO sessions (token, user_guid, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session.token)
        .bind(user_guid)
        .bind(time::now_rfc3339())
        .bind(&session.expires_at)
        .execute(pool)
        .await?;

    Ok(session)
}

/// User owning an unexpired session, if any
pub async fn find_session_user(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let user_guid: Option<String> = sqlx::query_scalar(
        "SELECT user_guid FROM sessions WHERE token = ? AND expires_at > ?",
    )
    .bind(token)
    .bind(time::now_rfc3339())
    .fetch_optional(pool)
    .await?;

    match user_guid {
        Some(guid) => {
            let creds: Credentials = super::users::get_credentials(pool, &guid).await?;
            Ok(Some(creds.user))
        }
        None => Ok(None),
    }
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop every session of a user except `keep` (if given)
pub async fn delete_user_sessions(pool: &SqlitePool, user_guid: &str, keep: Option<&str>) -> Result<u64> {
    let removed = sqlx::query("DELETE FROM sessions WHERE user_guid = ? AND (? IS NULL OR token != ?)")
        .bind(user_guid)
        .bind(keep)
        .bind(keep)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(removed)
}

pub async fn purge_expired(pool: &SqlitePool) -> Result<u64> {
    let removed = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(time::now_rfc3339())
        .execute(pool)
        .await?
        .rows_affected();
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::users::{create_user, NewUser};
    use crate::roles::Role;

    async fn user(pool: &SqlitePool) -> User {
        create_user(
            pool,
            NewUser {
                username: "session-user".into(),
                password: "password-123".into(),
                role: Role::Employee,
                full_name: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_lookup() {
        let (pool, _dir) = test_pool().await;
        let user = user(&pool).await;

        let session = create_session(&pool, &user.guid, 30).await.unwrap();
        let found = find_session_user(&pool, &session.token).await.unwrap().unwrap();
        assert_eq!(found.guid, user.guid);

        assert!(find_session_user(&pool, "bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_purged() {
        let (pool, _dir) = test_pool().await;
        let user = user(&pool).await;

        let expired = create_session(&pool, &user.guid, -1).await.unwrap();
        assert!(find_session_user(&pool, &expired.token).await.unwrap().is_none());

        create_session(&pool, &user.guid, 30).await.unwrap();
        assert_eq!(purge_expired(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_user_sessions_keeps_current() {
        let (pool, _dir) = test_pool().await;
        let user = user(&pool).await;

        let current = create_session(&pool, &user.guid, 30).await.unwrap();
        create_session(&pool, &user.guid, 30).await.unwrap();
        create_session(&pool, &user.guid, 30).await.unwrap();

        let removed = delete_user_sessions(&pool, &user.guid, Some(&current.token)).await.unwrap();
        assert_eq!(removed, 2);
        assert!(find_session_user(&pool, &current.token).await.unwrap().is_some());

        delete_session(&pool, &current.token).await.unwrap();
        assert!(find_session_user(&pool, &current.token).await.unwrap().is_none());
    }
}
