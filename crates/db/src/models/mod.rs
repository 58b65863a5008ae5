pub mod auth_session;
pub mod magic_link;
pub mod profile;
pub mod training_session;
pub mod user;
