//! Application configuration

mod app_config;

pub use app_config::{AppConfig, EngineConfig, LogFormat, LoggingConfig, ServerConfig};
