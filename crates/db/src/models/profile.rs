use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Public face of a user; `id` is the user's identity
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for renaming a profile
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateProfile {
    pub display_name: String,
}

impl Profile {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"SELECT id, display_name, created_at
            FROM profiles
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert the profile for `id` unless one already exists, then return it
    pub async fn ensure(
        pool: &SqlitePool,
        id: Uuid,
        display_name: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO profiles (id, display_name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(id) DO NOTHING"#,
        )
        .bind(id)
        .bind(display_name)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update_display_name(
        pool: &SqlitePool,
        id: Uuid,
        display_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"UPDATE profiles
            SET display_name = $2
            WHERE id = $1
            RETURNING id, display_name, created_at"#,
        )
        .bind(id)
        .bind(display_name)
        .fetch_optional(pool)
        .await
    }
}
