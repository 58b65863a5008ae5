//! Passwordless sign-in: magic-link issuance, code exchange, and cookie sessions.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use db::models::{auth_session::AuthSession, magic_link::MagicLink, profile::Profile, user::User};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;
use utils::{
    redirect::{safe_next_path, with_query},
    token::{generate_token, hash_token},
};
use uuid::Uuid;

use super::{
    config::Config,
    mailer::{MagicLinkEmail, Mailer, MailerError},
};

pub const CALLBACK_PATH: &str = "/auth/callback";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex"));

const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("mailer error: {0}")]
    Mailer(#[from] MailerError),
    #[error("failed to build sign-in link: {0}")]
    Link(#[from] url::ParseError),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("sign-in code is invalid or was already used")]
    InvalidCode,
    #[error("sign-in code has expired")]
    ExpiredCode,
}

/// A freshly created cookie session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Raw cookie value; only its hash is stored
    pub token: String,
    pub user_id: Uuid,
    pub profile: Profile,
    pub expires_at: DateTime<Utc>,
    pub new_user: bool,
}

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    mailer: Arc<dyn Mailer>,
    public_url: Url,
    magic_link_ttl: Duration,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(pool: SqlitePool, mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        Self {
            pool,
            mailer,
            public_url: config.public_url.clone(),
            magic_link_ttl: config.magic_link_ttl,
            session_ttl: config.auth_session_ttl,
        }
    }

    /// Lower-case and validate an email address
    pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
        let email = raw.trim().to_lowercase();
        if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(&email) {
            return Err(AuthError::InvalidEmail);
        }
        Ok(email)
    }

    /// Display name given to a profile created on first sign-in
    pub fn default_display_name(email: &str) -> String {
        email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or(email)
            .to_string()
    }

    /// Store a single-use code for `email` and mail the link carrying it.
    ///
    /// `next` is forwarded to the callback so the user lands where they
    /// started; the callback re-checks it.
    pub async fn request_magic_link(&self, email: &str, next: Option<&str>) -> Result<(), AuthError> {
        let email = Self::normalize_email(email)?;
        let code = generate_token();
        let expires_at = expires_after(Utc::now().timestamp(), self.magic_link_ttl);

        MagicLink::create(&self.pool, &email, &hash_token(&code), expires_at).await?;

        let next = next.map(|path| safe_next_path(Some(path)));
        let mut pairs = vec![("code", code.as_str())];
        if let Some(next) = next.as_deref() {
            pairs.push(("next", next));
        }
        let link = with_query(&self.public_url, CALLBACK_PATH, &pairs)?;

        self.mailer
            .send(&MagicLinkEmail::new(&email, &link, self.magic_link_ttl))
            .await?;

        info!(email = %email, expires_at = expires_at, "Magic link sent");
        Ok(())
    }

    /// Trade a magic-link code for a cookie session.
    ///
    /// The first exchange for an email creates the user and its profile.
    pub async fn exchange_code(&self, code: &str) -> Result<IssuedSession, AuthError> {
        let now = Utc::now().timestamp();
        let link = MagicLink::consume(&self.pool, &hash_token(code.trim()), now)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        if link.is_expired(now) {
            warn!(email = %link.email, "Expired magic link used");
            return Err(AuthError::ExpiredCode);
        }

        let (user, new_user) = User::find_or_create(&self.pool, &link.email).await?;
        let profile =
            Profile::ensure(&self.pool, user.id, &Self::default_display_name(&user.email)).await?;

        let token = generate_token();
        let expires_at = expires_after(now, self.session_ttl);
        AuthSession::create(&self.pool, user.id, &hash_token(&token), expires_at).await?;

        info!(user_id = %user.id, new_user = new_user, "User signed in");

        Ok(IssuedSession {
            token,
            user_id: user.id,
            profile,
            expires_at: DateTime::from_timestamp(expires_at, 0).unwrap_or_else(Utc::now),
            new_user,
        })
    }

    /// Identity behind a cookie token, if the session is live
    pub async fn resolve(&self, token: &str) -> Result<Option<Uuid>, AuthError> {
        let now = Utc::now().timestamp();
        let user_id = AuthSession::find_active_user_id(&self.pool, &hash_token(token), now).await?;
        if user_id.is_none() {
            debug!("Unknown or expired session cookie");
        }
        Ok(user_id)
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let removed = AuthSession::delete_by_token_hash(&self.pool, &hash_token(token)).await?;
        debug!(removed = removed, "Signed out");
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

/// Unix time `ttl` after `now`, clamped instead of overflowing
fn expires_after(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;
    use crate::services::mailer::OutboxMailer;

    async fn setup(config: Config) -> (AuthService, OutboxMailer, DBService) {
        let db = DBService::new_in_memory().await.unwrap();
        let outbox = OutboxMailer::new();
        let auth = AuthService::new(db.pool.clone(), Arc::new(outbox.clone()), &config);
        (auth, outbox, db)
    }

    fn code_from(link: &Url) -> String {
        link.query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn normalizes_and_validates_email() {
        assert_eq!(
            AuthService::normalize_email("  Ana@Example.COM ").unwrap(),
            "ana@example.com"
        );
        assert!(AuthService::normalize_email("ana").is_err());
        assert!(AuthService::normalize_email("ana@example").is_err());
        assert!(AuthService::normalize_email("a na@example.com").is_err());
        assert!(AuthService::normalize_email("").is_err());
    }

    #[test]
    fn expiry_saturates_for_huge_ttls() {
        assert_eq!(expires_after(1_000, Duration::from_secs(60)), 1_060);
        assert_eq!(expires_after(1_000, Duration::from_secs(u64::MAX)), i64::MAX);
        assert_eq!(
            expires_after(1_000, Duration::from_secs(i64::MAX as u64)),
            i64::MAX
        );
    }

    #[tokio::test]
    async fn exchange_survives_huge_session_ttl() {
        let config = Config {
            auth_session_ttl: Duration::from_secs(u64::MAX),
            ..Config::default()
        };
        let (auth, outbox, _db) = setup(config).await;
        auth.request_magic_link("ana@example.com", None).await.unwrap();

        let issued = auth
            .exchange_code(&code_from(&outbox.last_link().unwrap()))
            .await
            .unwrap();
        assert_eq!(auth.resolve(&issued.token).await.unwrap(), Some(issued.user_id));
    }

    #[test]
    fn display_name_is_local_part() {
        assert_eq!(AuthService::default_display_name("ana.silva@example.com"), "ana.silva");
    }

    #[tokio::test]
    async fn magic_link_points_at_callback() {
        let (auth, outbox, _db) = setup(Config::default()).await;
        auth.request_magic_link("ana@example.com", Some("/my-log"))
            .await
            .unwrap();

        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");

        let link = outbox.last_link().unwrap();
        assert_eq!(link.path(), CALLBACK_PATH);
        assert_eq!(link.host_str(), Some("127.0.0.1"));
        let next: Vec<_> = link
            .query_pairs()
            .filter(|(k, _)| k == "next")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(next, vec!["/my-log".to_string()]);
    }

    #[tokio::test]
    async fn invalid_email_sends_nothing() {
        let (auth, outbox, _db) = setup(Config::default()).await;
        assert!(matches!(
            auth.request_magic_link("not-an-email", None).await,
            Err(AuthError::InvalidEmail)
        ));
        assert!(outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn code_exchanges_once() {
        let (auth, outbox, _db) = setup(Config::default()).await;
        auth.request_magic_link("Ana@Example.com", None).await.unwrap();
        let code = code_from(&outbox.last_link().unwrap());

        let issued = auth.exchange_code(&code).await.unwrap();
        assert!(issued.new_user);
        assert_eq!(issued.profile.display_name, "ana");
        assert_eq!(issued.profile.id, issued.user_id);
        assert_eq!(auth.resolve(&issued.token).await.unwrap(), Some(issued.user_id));

        assert!(matches!(
            auth.exchange_code(&code).await,
            Err(AuthError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn second_sign_in_reuses_identity() {
        let (auth, outbox, _db) = setup(Config::default()).await;

        auth.request_magic_link("ana@example.com", None).await.unwrap();
        let first = auth
            .exchange_code(&code_from(&outbox.last_link().unwrap()))
            .await
            .unwrap();

        auth.request_magic_link("ana@example.com", None).await.unwrap();
        let second = auth
            .exchange_code(&code_from(&outbox.last_link().unwrap()))
            .await
            .unwrap();

        assert!(!second.new_user);
        assert_eq!(first.user_id, second.user_id);
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn expired_code_is_rejected() {
        let (auth, _outbox, db) = setup(Config::default()).await;
        let code = generate_token();
        MagicLink::create(
            &db.pool,
            "ana@example.com",
            &hash_token(&code),
            Utc::now().timestamp() - 1,
        )
        .await
        .unwrap();

        assert!(matches!(
            auth.exchange_code(&code).await,
            Err(AuthError::ExpiredCode)
        ));
    }

    #[tokio::test]
    async fn sign_out_invalidates_token() {
        let (auth, outbox, _db) = setup(Config::default()).await;
        auth.request_magic_link("ana@example.com", None).await.unwrap();
        let issued = auth
            .exchange_code(&code_from(&outbox.last_link().unwrap()))
            .await
            .unwrap();

        auth.sign_out(&issued.token).await.unwrap();
        assert_eq!(auth.resolve(&issued.token).await.unwrap(), None);
        assert_eq!(auth.resolve("garbage").await.unwrap(), None);
    }
}
