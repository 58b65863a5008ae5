use db::models::profile::Profile;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

const MAX_DISPLAY_NAME_LEN: usize = 80;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("profile not found")]
    NotFound,
}

pub struct ProfileService;

impl ProfileService {
    pub async fn get(pool: &SqlitePool, user_id: Uuid) -> Result<Profile, ProfileError> {
        Profile::find_by_id(pool, user_id)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    pub async fn rename(
        pool: &SqlitePool,
        user_id: Uuid,
        display_name: &str,
    ) -> Result<Profile, ProfileError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ProfileError::Validation("display_name is required".to_string()));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(ProfileError::Validation(format!(
                "display_name must be at most {MAX_DISPLAY_NAME_LEN} characters"
            )));
        }

        let profile = Profile::update_display_name(pool, user_id, display_name)
            .await?
            .ok_or(ProfileError::NotFound)?;
        info!(user_id = %user_id, "Profile renamed");
        Ok(profile)
    }
}
