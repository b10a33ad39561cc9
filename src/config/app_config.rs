use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::provider::ProvidersConfig;
use crate::infrastructure::services::QueryServiceConfig;
use crate::infrastructure::workflow::{WorkflowEngineConfig, WorkflowStoreConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Engine, store and facade tuning
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default = "default_true")]
    pub cancel_on_timeout: bool,
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    #[serde(default = "default_max_workflows")]
    pub max_workflows: u64,
    #[serde(default)]
    pub min_routing_confidence: f64,
    #[serde(default = "default_min_visualization_confidence")]
    pub min_visualization_confidence: f64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_wait_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_max_workflows() -> u64 {
    10_000
}

fn default_min_visualization_confidence() -> f64 {
    0.5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_ms: default_max_wait_ms(),
            cancel_on_timeout: true,
            retention_secs: default_retention_secs(),
            max_workflows: default_max_workflows(),
            min_routing_confidence: 0.0,
            min_visualization_confidence: default_min_visualization_confidence(),
        }
    }
}

impl EngineConfig {
    pub fn engine(&self) -> WorkflowEngineConfig {
        WorkflowEngineConfig {
            min_routing_confidence: self.min_routing_confidence,
            min_visualization_confidence: self.min_visualization_confidence,
        }
    }

    pub fn store(&self) -> WorkflowStoreConfig {
        WorkflowStoreConfig::default()
            .with_max_capacity(self.max_workflows)
            .with_retention(Duration::from_secs(self.retention_secs))
    }

    pub fn query_service(&self) -> QueryServiceConfig {
        QueryServiceConfig::default()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_max_wait(Duration::from_millis(self.max_wait_ms))
            .with_cancel_on_timeout(self.cancel_on_timeout)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
