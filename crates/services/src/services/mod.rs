pub mod access;
pub mod auth;
pub mod auth_sweeper;
pub mod config;
pub mod mailer;
pub mod profile;
pub mod stats;
pub mod training_log;
