use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// An authenticated identity, keyed by email
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, email, created_at
            FROM users
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, email, created_at
            FROM users
            WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Return the user for `email`, creating it on first sign-in.
    ///
    /// The second field is true when the row was created by this call.
    pub async fn find_or_create(pool: &SqlitePool, email: &str) -> Result<(Self, bool), sqlx::Error> {
        let id = Uuid::new_v4();
        let inserted = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, email, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(email) DO NOTHING
            RETURNING id, email, created_at"#,
        )
        .bind(id)
        .bind(email)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(user) => Ok((user, true)),
            None => Self::find_by_email(pool, email)
                .await?
                .map(|user| (user, false))
                .ok_or(sqlx::Error::RowNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn find_or_create_is_idempotent_per_email() {
        let db = DBService::new_in_memory().await.unwrap();

        let (first, created) = User::find_or_create(&db.pool, "ana@example.com").await.unwrap();
        assert!(created);
        let (second, created_again) = User::find_or_create(&db.pool, "ana@example.com")
            .await
            .unwrap();
        assert!(!created_again);
        assert_eq!(first.id, second.id);

        let found = User::find_by_id(&db.pool, first.id).await.unwrap().unwrap();
        assert_eq!(found.email, "ana@example.com");
    }
}
