pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod twitch;
