use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::services::{
    auth::AuthError, profile::ProfileError, training_log::TrainingLogError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    TrainingLog(#[from] TrainingLogError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("sign in required")]
    Unauthorized,
    #[error("{}", json_rejection_message(.0))]
    JsonBody(#[from] JsonRejection),
    #[error("invalid path parameter: {}", .0.body_text())]
    PathParam(#[from] PathRejection),
}

/// serde's own message, which leads with the offending field when there is one
fn json_rejection_message(rejection: &JsonRejection) -> String {
    let text = rejection.body_text();
    match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => text
            .split_once("target type: ")
            .map(|(_, detail)| detail.to_string())
            .unwrap_or(text),
        _ => text,
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::TrainingLog(err) => match err {
                TrainingLogError::Validation(_) => StatusCode::BAD_REQUEST,
                TrainingLogError::NotFound => StatusCode::NOT_FOUND,
                TrainingLogError::Forbidden => StatusCode::FORBIDDEN,
                TrainingLogError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Auth(err) => match err {
                AuthError::InvalidEmail | AuthError::InvalidCode | AuthError::ExpiredCode => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::Mailer(_) => StatusCode::BAD_GATEWAY,
                AuthError::Database(_) | AuthError::Link(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Profile(err) => match err {
                ProfileError::Validation(_) => StatusCode::BAD_REQUEST,
                ProfileError::NotFound => StatusCode::NOT_FOUND,
                ProfileError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::JsonBody(JsonRejection::MissingJsonContentType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::JsonBody(_) | ApiError::PathParam(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            StatusCode::BAD_GATEWAY => {
                error!(error = %self, "Upstream delivery failed");
                "Failed to send the magic link, try again later".to_string()
            }
            _ => self.to_string(),
        };

        (status, ResponseJson(ApiResponse::<()>::error(&message))).into_response()
    }
}
