//! Runtime configuration read from the environment.

use std::{fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Origin used when building links that leave the server (magic links)
    pub public_url: Url,
    pub magic_link_ttl: Duration,
    pub auth_session_ttl: Duration,
    pub cookie_secure: bool,
    /// When unset, magic links are written to the log instead of mailed
    pub mail_webhook_url: Option<Url>,
    pub auth_sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: "sqlite://bjj-log.sqlite".to_string(),
            public_url: Url::parse("http://127.0.0.1:3000").expect("static url"),
            magic_link_ttl: Duration::from_secs(60 * 60),
            auth_session_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            cookie_secure: false,
            mail_webhook_url: None,
            auth_sweep_interval: Duration::from_secs(300),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let public_url = match lookup("PUBLIC_URL") {
            Some(raw) => parse_url("PUBLIC_URL", &raw)?,
            None => parse_url("PUBLIC_URL", &format!("http://{host}:{port}"))?,
        };

        let magic_link_minutes: u64 = parse_or(&lookup, "MAGIC_LINK_TTL_MINUTES", 60)?;
        let auth_session_days: u64 = parse_or(&lookup, "AUTH_SESSION_TTL_DAYS", 30)?;
        let sweep_secs: u64 = parse_or(&lookup, "AUTH_SWEEP_INTERVAL_SECS", 300)?;

        if magic_link_minutes == 0 {
            return Err(invalid("MAGIC_LINK_TTL_MINUTES", "must be at least 1"));
        }
        if auth_session_days == 0 {
            return Err(invalid("AUTH_SESSION_TTL_DAYS", "must be at least 1"));
        }
        if sweep_secs == 0 {
            return Err(invalid("AUTH_SWEEP_INTERVAL_SECS", "must be at least 1"));
        }

        let magic_link_ttl = secs_from("MAGIC_LINK_TTL_MINUTES", magic_link_minutes, 60)?;
        let auth_session_ttl = secs_from("AUTH_SESSION_TTL_DAYS", auth_session_days, 24 * 60 * 60)?;

        let mail_webhook_url = lookup("MAIL_WEBHOOK_URL")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_url("MAIL_WEBHOOK_URL", &raw))
            .transpose()?;

        Ok(Self {
            host,
            port,
            database_url,
            public_url,
            magic_link_ttl,
            auth_session_ttl,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", defaults.cookie_secure)?,
            mail_webhook_url,
            auth_sweep_interval: Duration::from_secs(sweep_secs),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: message.into(),
    }
}

/// `value` units of `unit_secs` seconds, kept within what a unix timestamp can add
fn secs_from(key: &'static str, value: u64, unit_secs: u64) -> Result<Duration, ConfigError> {
    value
        .checked_mul(unit_secs)
        .filter(|secs| i64::try_from(*secs).is_ok())
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(key, "is too large"))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(key, e.to_string())),
        None => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| invalid(key, e.to_string()))
}
