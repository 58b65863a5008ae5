//! Background cleanup of expired sign-in state.

use std::time::Duration;

use chrono::Utc;
use db::{
    DBService,
    models::{auth_session::AuthSession, magic_link::MagicLink},
};
use sqlx::SqlitePool;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Rows removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub magic_links: u64,
    pub auth_sessions: u64,
}

/// Periodically deletes used or expired magic links and expired auth sessions
pub struct AuthSweeper {
    db: DBService,
    poll_interval: Duration,
}

impl AuthSweeper {
    /// Spawn the background sweeper
    pub async fn spawn(db: DBService, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = Self { db, poll_interval };
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!("Starting auth sweeper with interval {:?}", self.poll_interval);

        let mut interval = interval(self.poll_interval);

        loop {
            interval.tick().await;
            if let Err(e) = Self::sweep(&self.db.pool).await {
                error!("Error sweeping expired auth state: {}", e);
            }
        }
    }

    pub async fn sweep(pool: &SqlitePool) -> Result<SweepReport, sqlx::Error> {
        let now = Utc::now().timestamp();
        let report = SweepReport {
            magic_links: MagicLink::delete_stale(pool, now).await?,
            auth_sessions: AuthSession::delete_expired(pool, now).await?,
        };

        if report == SweepReport::default() {
            debug!("Auth sweep: nothing to remove");
        } else {
            info!(
                magic_links = report.magic_links,
                auth_sessions = report.auth_sessions,
                "Auth sweep removed stale rows"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use db::models::user::User;

    use super::*;

    #[tokio::test]
    async fn sweep_removes_only_stale_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        let now = Utc::now().timestamp();
        let (user, _) = User::find_or_create(&db.pool, "ana@example.com").await.unwrap();

        MagicLink::create(&db.pool, "ana@example.com", "old-link", now - 10)
            .await
            .unwrap();
        MagicLink::create(&db.pool, "ana@example.com", "new-link", now + 600)
            .await
            .unwrap();
        AuthSession::create(&db.pool, user.id, "old-session", now - 10)
            .await
            .unwrap();
        AuthSession::create(&db.pool, user.id, "new-session", now + 600)
            .await
            .unwrap();

        let report = AuthSweeper::sweep(&db.pool).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                magic_links: 1,
                auth_sessions: 1
            }
        );
        assert_eq!(
            AuthSweeper::sweep(&db.pool).await.unwrap(),
            SweepReport::default()
        );
        assert_eq!(
            AuthSession::find_active_user_id(&db.pool, "new-session", now)
                .await
                .unwrap(),
            Some(user.id)
        );
    }
}
