//! Logging, listing, and deleting training sessions.

use chrono::{NaiveDate, Utc};
use db::models::training_session::{
    CreateTrainingSession, FEED_LIMIT, GiType, SessionWithProfile, TrainingSession,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{access::can_delete, stats::LogStats};

const MAX_GYM_LEN: usize = 120;
const MAX_NOTES_LEN: usize = 4000;
const MAX_DURATION_MIN: i64 = 24 * 60;

#[derive(Debug, Error)]
pub enum TrainingLogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("session not found")]
    NotFound,
    #[error("only the owner can delete this session")]
    Forbidden,
}

/// Raw form input for logging a session
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct NewSessionForm {
    /// `YYYY-MM-DD`; today when omitted
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub gym: String,
    /// `"gi"` or `"nogi"`; checked by `validate` so a bad value names the field
    #[serde(default)]
    #[ts(as = "GiType")]
    pub gi_type: String,
    #[serde(default)]
    pub duration_min: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewSessionForm {
    /// Check every field and produce the row to insert
    pub fn validate(self, today: NaiveDate) -> Result<CreateTrainingSession, TrainingLogError> {
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| invalid("date must be formatted as YYYY-MM-DD"))?,
        };

        let gym = self.gym.trim().to_string();
        if gym.is_empty() {
            return Err(invalid("gym is required"));
        }
        if gym.chars().count() > MAX_GYM_LEN {
            return Err(invalid(format!(
                "gym must be at most {MAX_GYM_LEN} characters"
            )));
        }

        let gi_type = self
            .gi_type
            .trim()
            .parse::<GiType>()
            .map_err(|_| invalid("gi_type must be \"gi\" or \"nogi\""))?;

        if self.duration_min < 1 {
            return Err(invalid("duration_min must be at least 1"));
        }
        if self.duration_min > MAX_DURATION_MIN {
            return Err(invalid(format!(
                "duration_min must be at most {MAX_DURATION_MIN}"
            )));
        }

        let notes = self
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());
        if notes
            .as_ref()
            .is_some_and(|notes| notes.chars().count() > MAX_NOTES_LEN)
        {
            return Err(invalid(format!(
                "notes must be at most {MAX_NOTES_LEN} characters"
            )));
        }

        Ok(CreateTrainingSession {
            date,
            gym,
            gi_type,
            // bounded above by MAX_DURATION_MIN
            duration_min: self.duration_min as i32,
            notes,
        })
    }
}

fn invalid(message: impl Into<String>) -> TrainingLogError {
    TrainingLogError::Validation(message.into())
}

/// The signed-in user's own sessions plus their totals
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MyLog {
    pub sessions: Vec<TrainingSession>,
    /// `None` when nothing has been logged yet
    pub stats: Option<LogStats>,
}

/// One session as shown on its detail page
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SessionDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub session: SessionWithProfile,
    pub can_delete: bool,
    pub gi_label: String,
    /// e.g. "Friday, 16 October 2026"
    pub date_display: String,
    /// Time of day the session was logged, e.g. "14:05"
    pub logged_at_display: String,
}

impl SessionDetail {
    pub fn new(session: SessionWithProfile, current_user: Option<Uuid>) -> Self {
        let can_delete = can_delete(&session, current_user);
        Self {
            can_delete,
            gi_label: session.session.gi_type.label().to_string(),
            date_display: session.session.date.format("%A, %-d %B %Y").to_string(),
            logged_at_display: session.session.created_at.format("%H:%M").to_string(),
            session,
        }
    }
}

pub struct TrainingLogService;

impl TrainingLogService {
    /// Newest sessions from everyone
    pub async fn feed(pool: &SqlitePool) -> Result<Vec<SessionWithProfile>, TrainingLogError> {
        Ok(TrainingSession::find_recent_with_profile(pool, FEED_LIMIT).await?)
    }

    pub async fn personal_log(pool: &SqlitePool, user_id: Uuid) -> Result<MyLog, TrainingLogError> {
        let sessions = TrainingSession::find_by_user_id(pool, user_id).await?;
        let stats = LogStats::from_sessions(&sessions);
        Ok(MyLog {
            stats: (!stats.is_empty()).then_some(stats),
            sessions,
        })
    }

    pub async fn detail(
        pool: &SqlitePool,
        id: Uuid,
        current_user: Option<Uuid>,
    ) -> Result<SessionDetail, TrainingLogError> {
        let session = TrainingSession::find_by_id_with_profile(pool, id)
            .await?
            .ok_or(TrainingLogError::NotFound)?;
        Ok(SessionDetail::new(session, current_user))
    }

    pub async fn log_session(
        pool: &SqlitePool,
        user_id: Uuid,
        form: NewSessionForm,
    ) -> Result<TrainingSession, TrainingLogError> {
        let data = form.validate(Utc::now().date_naive())?;
        let session = TrainingSession::create(pool, user_id, &data).await?;

        info!(
            user_id = %user_id,
            session_id = %session.id,
            gi_type = %session.gi_type,
            duration_min = session.duration_min,
            "Training session logged"
        );

        Ok(session)
    }

    /// Delete a session owned by `user_id`.
    ///
    /// The statement is scoped to the owner; a miss is then classified as
    /// not found or forbidden.
    pub async fn delete_session(
        pool: &SqlitePool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), TrainingLogError> {
        if TrainingSession::delete_owned(pool, id, user_id).await? > 0 {
            info!(user_id = %user_id, session_id = %id, "Training session deleted");
            return Ok(());
        }

        match TrainingSession::find_by_id(pool, id).await? {
            None => Err(TrainingLogError::NotFound),
            Some(session) => {
                warn!(
                    user_id = %user_id,
                    owner_id = %session.user_id,
                    session_id = %id,
                    "Refused to delete another user's session"
                );
                Err(TrainingLogError::Forbidden)
            }
        }
    }
}
