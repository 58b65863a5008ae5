use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::DeploymentImpl;

pub mod auth;
pub mod feed;
pub mod health;
pub mod my_log;
pub mod profile;
pub mod sessions;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .merge(feed::router(&deployment))
        .merge(my_log::router(&deployment))
        .merge(sessions::router(&deployment))
        .merge(profile::router(&deployment));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router(&deployment))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
