use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::profile::Profile;

/// Number of sessions shown on the shared feed
pub const FEED_LIMIT: i64 = 50;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
)]
#[sqlx(type_name = "gi_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GiType {
    Gi,
    Nogi,
}

impl GiType {
    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            GiType::Gi => "Gi",
            GiType::Nogi => "No-Gi",
        }
    }
}

/// A logged training session
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct TrainingSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub gym: String,
    pub gi_type: GiType,
    pub duration_min: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated fields for a new session; `id` and `created_at` are assigned on insert
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct CreateTrainingSession {
    pub date: NaiveDate,
    pub gym: String,
    pub gi_type: GiType,
    pub duration_min: i32,
    pub notes: Option<String>,
}

/// A session together with the profile of the user who logged it
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct SessionWithProfile {
    #[serde(flatten)]
    #[ts(flatten)]
    pub session: TrainingSession,
    pub profile: Profile,
}

#[derive(FromRow)]
struct SessionProfileRow {
    id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    gym: String,
    gi_type: GiType,
    duration_min: i32,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    profile_display_name: String,
    profile_created_at: DateTime<Utc>,
}

impl From<SessionProfileRow> for SessionWithProfile {
    fn from(row: SessionProfileRow) -> Self {
        Self {
            profile: Profile {
                id: row.user_id,
                display_name: row.profile_display_name,
                created_at: row.profile_created_at,
            },
            session: TrainingSession {
                id: row.id,
                user_id: row.user_id,
                date: row.date,
                gym: row.gym,
                gi_type: row.gi_type,
                duration_min: row.duration_min,
                notes: row.notes,
                created_at: row.created_at,
            },
        }
    }
}

const SESSION_WITH_PROFILE_SELECT: &str = r#"SELECT
        s.id,
        s.user_id,
        s.date,
        s.gym,
        s.gi_type,
        s.duration_min,
        s.notes,
        s.created_at,
        p.display_name AS profile_display_name,
        p.created_at   AS profile_created_at
    FROM sessions s
    JOIN profiles p ON p.id = s.user_id"#;

impl TrainingSession {
    pub async fn create(
        pool: &SqlitePool,
        user_id: Uuid,
        data: &CreateTrainingSession,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, TrainingSession>(
            r#"INSERT INTO sessions (id, user_id, date, gym, gi_type, duration_min, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, date, gym, gi_type, duration_min, notes, created_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.date)
        .bind(&data.gym)
        .bind(data.gi_type)
        .bind(data.duration_min)
        .bind(&data.notes)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TrainingSession>(
            r#"SELECT id, user_id, date, gym, gi_type, duration_min, notes, created_at
            FROM sessions
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// All sessions of one user, newest first
    pub async fn find_by_user_id(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TrainingSession>(
            r#"SELECT id, user_id, date, gym, gi_type, duration_min, notes, created_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Most recent sessions across all users, newest first
    pub async fn find_recent_with_profile(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<SessionWithProfile>, sqlx::Error> {
        let sql = format!("{SESSION_WITH_PROFILE_SELECT} ORDER BY s.created_at DESC, s.rowid DESC LIMIT $1");
        let rows = sqlx::query_as::<_, SessionProfileRow>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id_with_profile(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<SessionWithProfile>, sqlx::Error> {
        let sql = format!("{SESSION_WITH_PROFILE_SELECT} WHERE s.id = $1");
        let row = sqlx::query_as::<_, SessionProfileRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Delete `id` only if it belongs to `user_id`. Returns rows affected.
    pub async fn delete_owned(pool: &SqlitePool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
