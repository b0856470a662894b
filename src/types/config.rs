//! Service configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::validate_replicas;
use crate::DEFAULT_REPLICAS;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3017;

/// Configuration for the chash service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Port to listen on
    pub port: u16,

    /// Replica count for groups created without an explicit one
    pub default_replicas: usize,

    /// Snapshot restored at startup and written at shutdown
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Emit logs as JSON
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            default_replicas: DEFAULT_REPLICAS,
            snapshot_path: None,
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `CHASH_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ::config::ConfigError> {
        let defaults = Self::default();
        let config: Self = ::config::Config::builder()
            .set_default("port", i64::from(defaults.port))?
            .set_default("default_replicas", defaults.default_replicas as i64)?
            .set_default("log_json", defaults.log_json)?
            .add_source(::config::Environment::with_prefix("CHASH").try_parsing(true))
            .build()?
            .try_deserialize()?;

        validate_replicas(config.default_replicas)
            .map_err(|e| ::config::ConfigError::Message(format!("default_replicas: {}", e)))?;
        Ok(config)
    }
}
