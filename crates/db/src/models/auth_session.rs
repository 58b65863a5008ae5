use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// Server side of a sign-in cookie. Times are unix seconds.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct AuthSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: i64,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, AuthSession>(
            r#"INSERT INTO auth_sessions (id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_hash, expires_at, created_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Identity behind a cookie token hash, if the session is still live
    pub async fn find_active_user_id(
        pool: &SqlitePool,
        token_hash: &str,
        now: i64,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"SELECT user_id
            FROM auth_sessions
            WHERE token_hash = $1 AND expires_at > $2"#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_by_token_hash(pool: &SqlitePool, token_hash: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_expired(pool: &SqlitePool, now: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DBService, models::user::User};

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let db = DBService::new_in_memory().await.unwrap();
        let (user, _) = User::find_or_create(&db.pool, "ana@example.com").await.unwrap();
        let now = Utc::now().timestamp();

        AuthSession::create(&db.pool, user.id, "live", now + 60).await.unwrap();
        AuthSession::create(&db.pool, user.id, "old", now - 60).await.unwrap();

        assert_eq!(
            AuthSession::find_active_user_id(&db.pool, "live", now).await.unwrap(),
            Some(user.id)
        );
        assert_eq!(
            AuthSession::find_active_user_id(&db.pool, "old", now).await.unwrap(),
            None
        );

        assert_eq!(AuthSession::delete_expired(&db.pool, now).await.unwrap(), 1);
        assert_eq!(
            AuthSession::delete_by_token_hash(&db.pool, "live").await.unwrap(),
            1
        );
        assert_eq!(
            AuthSession::find_active_user_id(&db.pool, "live", now).await.unwrap(),
            None
        );
    }
}
