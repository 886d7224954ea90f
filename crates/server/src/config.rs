//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Prediction server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Directory holding the per-scenario model artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_artifacts_dir() -> String {
    "ml_artifacts".to_string()
}

fn default_api_port() -> u16 {
    8080
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PREDICTOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServerConfig {
            artifacts_dir: default_artifacts_dir(),
            api_port: default_api_port(),
        }))
    }
}
