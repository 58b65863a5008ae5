use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    auth::AuthService,
    auth_sweeper::AuthSweeper,
    config::Config,
    mailer::{LogMailer, Mailer, WebhookMailer},
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Single-process deployment backed by a SQLite file
#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    auth: AuthService,
}

impl LocalDeployment {
    /// Assemble a deployment from already-built parts
    pub fn from_parts(config: Config, db: DBService, mailer: Arc<dyn Mailer>) -> Self {
        let auth = AuthService::new(db.pool.clone(), mailer, &config);
        Self {
            config: Arc::new(config),
            db,
            auth,
        }
    }

    pub async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;

        let mailer: Arc<dyn Mailer> = match &config.mail_webhook_url {
            Some(url) => {
                info!(webhook = %url, "Magic links will be delivered through the mail webhook");
                Arc::new(WebhookMailer::new(url.clone())?)
            }
            None => {
                warn!("MAIL_WEBHOOK_URL not set - magic links will only be written to the log");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::from_parts(config, db, mailer))
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        Self::from_config(Config::from_env()?).await
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }

    async fn spawn_background_services(&self) -> Vec<JoinHandle<()>> {
        vec![AuthSweeper::spawn(self.db.clone(), self.config.auth_sweep_interval).await]
    }
}

#[cfg(test)]
mod tests {
    use db::models::training_session::TrainingSession;

    use super::*;

    #[tokio::test]
    async fn from_config_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bjj-log.sqlite");
        let config = Config {
            database_url: format!("sqlite://{}", path.display()),
            ..Config::default()
        };

        let deployment = LocalDeployment::from_config(config).await.unwrap();
        assert!(path.exists());
        assert_eq!(deployment.config().port, 3000);

        let feed = TrainingSession::find_recent_with_profile(&deployment.db().pool, 10)
            .await
            .unwrap();
        assert!(feed.is_empty());
    }
}
