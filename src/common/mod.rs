pub mod config;
pub mod config_commands;

pub use config::{AppConfig, ReceiverSettings, ServerSettings};
