//! Delivery of magic-link emails.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

const SUBJECT: &str = "Your BJJ Training Log sign-in link";

#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
}

impl MailerError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
        }
    }
}

/// A rendered sign-in email
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MagicLinkEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub link: String,
}

impl MagicLinkEmail {
    pub fn new(to: impl Into<String>, link: &Url, valid_for: Duration) -> Self {
        let minutes = valid_for.as_secs().div_ceil(60);
        Self {
            to: to.into(),
            subject: SUBJECT.to_string(),
            text: format!(
                "Click the link below to sign in. It works once and expires in {minutes} minutes.\n\n{link}\n\nIf you did not ask to sign in, ignore this email."
            ),
            link: link.to_string(),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &MagicLinkEmail) -> Result<(), MailerError>;
}

/// Writes links to the log; the default when no webhook is configured
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &MagicLinkEmail) -> Result<(), MailerError> {
        info!(to = %email.to, link = %email.link, "Magic link issued (log delivery)");
        Ok(())
    }
}

/// Keeps every message in memory
#[derive(Debug, Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<MagicLinkEmail>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MagicLinkEmail> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_link(&self) -> Option<Url> {
        self.sent()
            .last()
            .and_then(|email| Url::parse(&email.link).ok())
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: &MagicLinkEmail) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(email.clone());
        Ok(())
    }
}

/// POSTs each message as JSON to a mail relay
#[derive(Debug, Clone)]
pub struct WebhookMailer {
    http: Client,
    url: Url,
}

impl WebhookMailer {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(url: Url) -> Result<Self, MailerError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("bjj-log/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MailerError::Transport(e.to_string()))?;
        Ok(Self { http, url })
    }

    async fn post(&self, email: &MagicLinkEmail) -> Result<(), MailerError> {
        let res = self
            .http
            .post(self.url.clone())
            .json(email)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(MailerError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, email: &MagicLinkEmail) -> Result<(), MailerError> {
        (|| async { self.post(email).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(500))
                    .with_max_delay(Duration::from_secs(10))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &MailerError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Mail webhook call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await?;

        info!(to = %email.to, "Magic link handed to mail webhook");
        Ok(())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> MailerError {
    if e.is_timeout() {
        MailerError::Timeout
    } else {
        MailerError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_mentions_link_and_expiry() {
        let link = Url::parse("http://localhost:3000/auth/callback?code=abc").unwrap();
        let email = MagicLinkEmail::new("ana@example.com", &link, Duration::from_secs(3600));
        assert_eq!(email.to, "ana@example.com");
        assert_eq!(email.link, link.as_str());
        assert!(email.text.contains("expires in 60 minutes"));
        assert!(email.text.contains(link.as_str()));
    }

    #[test]
    fn retry_policy() {
        assert!(MailerError::Timeout.should_retry());
        assert!(
            MailerError::Http {
                status: 503,
                body: String::new()
            }
            .should_retry()
        );
        assert!(
            MailerError::Http {
                status: 429,
                body: String::new()
            }
            .should_retry()
        );
        assert!(
            !MailerError::Http {
                status: 400,
                body: String::new()
            }
            .should_retry()
        );
    }

    #[tokio::test]
    async fn outbox_records_messages() {
        let outbox = OutboxMailer::new();
        let link = Url::parse("http://localhost:3000/auth/callback?code=abc").unwrap();
        outbox
            .send(&MagicLinkEmail::new("ana@example.com", &link, Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(outbox.sent().len(), 1);
        assert_eq!(outbox.last_link(), Some(link));
    }
}
