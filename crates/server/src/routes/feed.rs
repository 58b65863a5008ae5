use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::training_session::SessionWithProfile;
use deployment::Deployment;
use services::services::training_log::TrainingLogService;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// GET /api/feed
/// The 50 most recent sessions from everyone, newest first
pub async fn get_feed(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<SessionWithProfile>>>, ApiError> {
    let feed = TrainingLogService::feed(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(feed)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/feed", get(get_feed))
}
