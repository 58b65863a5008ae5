use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use services::services::training_log::{MyLog, TrainingLogService};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::auth::CurrentUser};

/// GET /api/my-log
/// The caller's sessions, newest first, with totals
pub async fn get_my_log(
    State(deployment): State<DeploymentImpl>,
    CurrentUser(user_id): CurrentUser,
) -> Result<ResponseJson<ApiResponse<MyLog>>, ApiError> {
    let log = TrainingLogService::personal_log(&deployment.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(log)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/my-log", get(get_my_log))
}
