use axum::{
    Router,
    extract::{Query, State},
    response::{Json as ResponseJson, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use ts_rs::TS;
use url::form_urlencoded::byte_serialize;
use utils::{redirect::safe_next_path, response::ApiResponse};

use crate::{
    DeploymentImpl,
    error::ApiError,
    extract::ApiJson,
    middleware::auth::{SESSION_COOKIE, removal_cookie, session_cookie},
};

const LOGIN_PATH: &str = "/login";

/// Request body for POST /auth/magic-link
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct MagicLinkRequest {
    pub email: String,
    /// Local path to land on after signing in
    #[serde(default)]
    pub next: Option<String>,
}

/// Query string the magic link (or the mail provider) sends back
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub next: Option<String>,
}

/// POST /auth/magic-link
/// Email a single-use sign-in link
pub async fn request_magic_link(
    State(deployment): State<DeploymentImpl>,
    ApiJson(payload): ApiJson<MagicLinkRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment
        .auth()
        .request_magic_link(&payload.email, payload.next.as_deref())
        .await?;

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Check your email for the magic link!",
    )))
}

/// GET /auth/callback
/// Exchange the code for a session cookie, then redirect
pub async fn auth_callback(
    State(deployment): State<DeploymentImpl>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    if let Some(error) = params.error.as_deref() {
        warn!(
            error = %error,
            description = params.error_description.as_deref().unwrap_or(""),
            "Auth error on callback"
        );
        return (jar, login_redirect(error));
    }

    let Some(code) = params.code.as_deref().filter(|code| !code.trim().is_empty()) else {
        return (jar, login_redirect("no_code"));
    };

    match deployment.auth().exchange_code(code).await {
        Ok(issued) => {
            let next = safe_next_path(params.next.as_deref());
            let cookie = session_cookie(issued.token, deployment.config());
            (jar.add(cookie), Redirect::to(&next))
        }
        Err(e) => {
            error!(error = %e, "Auth callback exchange failed");
            (jar, login_redirect("exchange_failed"))
        }
    }
}

/// POST /auth/sign-out
/// The cookie is cleared even when the stored session could not be deleted
pub async fn sign_out(
    State(deployment): State<DeploymentImpl>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) {
        if let Err(e) = deployment.auth().sign_out(&token).await {
            error!(error = %e, "Failed to delete auth session on sign-out");
        }
    }
    (jar.remove(removal_cookie()), Redirect::to(LOGIN_PATH))
}

fn login_redirect(error: &str) -> Redirect {
    let error: String = byte_serialize(error.as_bytes()).collect();
    Redirect::to(&format!("{LOGIN_PATH}?error={error}"))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/magic-link", post(request_magic_link))
            .route("/callback", get(auth_callback))
            .route("/sign-out", post(sign_out)),
    )
}
