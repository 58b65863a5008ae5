use async_trait::async_trait;
use db::DBService;
use services::services::{
    auth::AuthService,
    config::{Config, ConfigError},
    mailer::MailerError,
};
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Mailer(#[from] MailerError),
}

/// Everything a request handler needs, shared across the server
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    /// Build from the process environment
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn auth(&self) -> &AuthService;

    /// Start long-running maintenance tasks
    async fn spawn_background_services(&self) -> Vec<JoinHandle<()>>;
}
