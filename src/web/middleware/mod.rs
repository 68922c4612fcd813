pub mod auth;
pub mod watch_config;
