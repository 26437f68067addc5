//! Demo configuration, loaded from TOML.

use std::path::Path;

use commerce_cart::SubmitterConfig;
use commerce_client::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DemoError, DemoResult};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "COMMERCE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub submitter: SubmitterConfig,
}

impl DemoConfig {
    /// Resolve the config path: explicit path > `COMMERCE_CONFIG` > default.
    pub fn resolve_path(explicit: Option<String>) -> String {
        explicit
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &str) -> DemoResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> DemoResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DemoError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> DemoResult<Self> {
        toml::from_str(content)
            .map_err(|e| DemoError::Config(format!("Failed to parse config: {e}")))
    }
}
