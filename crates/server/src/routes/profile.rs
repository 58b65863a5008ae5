use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::profile::{Profile, UpdateProfile};
use deployment::Deployment;
use services::services::profile::ProfileService;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl, error::ApiError, extract::ApiJson, middleware::auth::CurrentUser,
};

/// GET /api/me
pub async fn get_me(
    State(deployment): State<DeploymentImpl>,
    CurrentUser(user_id): CurrentUser,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let profile = ProfileService::get(&deployment.db().pool, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// PATCH /api/me
pub async fn update_me(
    State(deployment): State<DeploymentImpl>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<UpdateProfile>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let profile =
        ProfileService::rename(&deployment.db().pool, user_id, &payload.display_name).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/me", get(get_me).patch(update_me))
}
