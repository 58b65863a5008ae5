use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::training_session::TrainingSession;
use deployment::Deployment;
use services::services::training_log::{NewSessionForm, SessionDetail, TrainingLogService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    middleware::auth::{CurrentUser, MaybeUser},
};

/// POST /api/sessions
/// Log a new training session for the caller
pub async fn create_session(
    State(deployment): State<DeploymentImpl>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<NewSessionForm>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TrainingSession>>), ApiError> {
    let session = TrainingLogService::log_session(&deployment.db().pool, user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            session,
            "Session logged successfully!",
        )),
    ))
}

/// GET /api/sessions/{session_id}
pub async fn get_session(
    State(deployment): State<DeploymentImpl>,
    MaybeUser(user_id): MaybeUser,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<SessionDetail>>, ApiError> {
    let detail = TrainingLogService::detail(&deployment.db().pool, session_id, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(detail)))
}

/// DELETE /api/sessions/{session_id}
/// Only the owner may delete; anyone else gets 403 and the row stays
pub async fn delete_session(
    State(deployment): State<DeploymentImpl>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(session_id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TrainingLogService::delete_session(&deployment.db().pool, user_id, session_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}", get(get_session).delete(delete_session))
}
