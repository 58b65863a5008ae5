use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// A pending or consumed sign-in link. Times are unix seconds.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct MagicLink {
    pub id: Uuid,
    pub email: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub consumed_at: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl MagicLink {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, MagicLink>(
            r#"INSERT INTO magic_links (id, email, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, token_hash, expires_at, consumed_at, created_at"#,
        )
        .bind(id)
        .bind(email)
        .bind(token_hash)
        .bind(expires_at)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Mark the link as used and return it.
    ///
    /// Returns `None` when no unconsumed link has this hash, so a code can
    /// only ever be consumed once even under concurrent callbacks.
    pub async fn consume(
        pool: &SqlitePool,
        token_hash: &str,
        now: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, MagicLink>(
            r#"UPDATE magic_links
            SET consumed_at = $2
            WHERE token_hash = $1 AND consumed_at IS NULL
            RETURNING id, email, token_hash, expires_at, consumed_at, created_at"#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await
    }

    /// Remove links that expired or were already used
    pub async fn delete_stale(pool: &SqlitePool, now: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM magic_links WHERE expires_at <= $1 OR consumed_at IS NOT NULL",
        )
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn consume_is_single_use() {
        let db = DBService::new_in_memory().await.unwrap();
        let now = Utc::now().timestamp();
        MagicLink::create(&db.pool, "ana@example.com", "hash-1", now + 60)
            .await
            .unwrap();

        let first = MagicLink::consume(&db.pool, "hash-1", now).await.unwrap();
        assert_eq!(first.unwrap().consumed_at, Some(now));
        assert!(MagicLink::consume(&db.pool, "hash-1", now).await.unwrap().is_none());
        assert!(MagicLink::consume(&db.pool, "unknown", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_stale_keeps_live_links() {
        let db = DBService::new_in_memory().await.unwrap();
        let now = Utc::now().timestamp();
        MagicLink::create(&db.pool, "a@example.com", "expired", now - 1)
            .await
            .unwrap();
        MagicLink::create(&db.pool, "b@example.com", "used", now + 60)
            .await
            .unwrap();
        MagicLink::create(&db.pool, "c@example.com", "live", now + 60)
            .await
            .unwrap();
        MagicLink::consume(&db.pool, "used", now).await.unwrap();

        assert_eq!(MagicLink::delete_stale(&db.pool, now).await.unwrap(), 2);
        assert!(MagicLink::consume(&db.pool, "live", now).await.unwrap().is_some());
    }
}
