pub mod log;
pub mod redirect;
pub mod response;
pub mod token;
