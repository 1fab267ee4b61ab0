//! JSON configuration adapter.
//!
//! Implements [`ConfigPort`] over an optional JSON file.  Fields missing
//! from the file keep their defaults; every loaded config is validated
//! before it is handed out.

use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

pub struct JsonConfig {
    path: Option<PathBuf>,
}

impl JsonConfig {
    /// Read from `path`.  A missing file yields the defaults.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// No backing file: always the defaults.
    pub fn defaults() -> Self {
        Self { path: None }
    }

    /// Parse and validate a JSON document.
    pub fn parse(text: &str) -> Result<SystemConfig, ConfigError> {
        let cfg: SystemConfig = serde_json::from_str(text).map_err(|e| {
            warn!("JsonConfig: parse error: {}", e);
            ConfigError::Corrupted
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}

impl ConfigPort for JsonConfig {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(path) = &self.path else {
            info!("JsonConfig: no config file, using defaults");
            return Ok(SystemConfig::default());
        };
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let cfg = Self::parse(&text)?;
                info!("JsonConfig: loaded {}", path.display());
                Ok(cfg)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("JsonConfig: {} not found, using defaults", path.display());
                Ok(SystemConfig::default())
            }
            Err(e) => {
                warn!("JsonConfig: cannot read {}: {}", path.display(), e);
                Err(ConfigError::IoError)
            }
        }
    }
}
