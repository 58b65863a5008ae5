//! Session-cookie identity extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use deployment::Deployment;
use services::services::config::Config;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

pub const SESSION_COOKIE: &str = "bjj_session";

/// The signed-in user, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeUser(pub Option<Uuid>);

/// The signed-in user; rejects anonymous requests with 401
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl FromRequestParts<DeploymentImpl> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) else {
            return Ok(MaybeUser(None));
        };
        let user_id = deployment.auth().resolve(&token).await?;
        Ok(MaybeUser(user_id))
    }
}

impl FromRequestParts<DeploymentImpl> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user_id) = MaybeUser::from_request_parts(parts, deployment).await?;
        user_id.map(CurrentUser).ok_or(ApiError::Unauthorized)
    }
}

pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    let max_age = i64::try_from(config.auth_session_ttl.as_secs()).unwrap_or(i64::MAX);
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
