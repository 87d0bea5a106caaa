//! Environment-driven configuration adapter.
//!
//! Implements [`ConfigPort`] from two sources, applied in order:
//!
//! 1. `UNBRAKE_CONFIG`: path to a JSON file with any subset of
//!    [`ControllerConfig`] fields.  Missing file variable → defaults.
//! 2. `SIMULATOR_PORT`: overrides `device_path`.
//!
//! The result is validated before it is returned.

use std::fs;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ControllerConfig;

/// Variable naming the JSON config file.
pub const CONFIG_PATH_VAR: &str = "UNBRAKE_CONFIG";
/// Variable overriding the serial device path.
pub const DEVICE_PATH_VAR: &str = "SIMULATOR_PORT";

/// Variable lookup, `std::env::var` in production.
type Lookup = fn(&str) -> Option<String>;

pub struct EnvConfig<F = Lookup> {
    lookup: F,
}

impl EnvConfig {
    /// Read from the process environment.
    pub fn from_env() -> Self {
        Self {
            lookup: |key| std::env::var(key).ok(),
        }
    }
}

impl<F> EnvConfig<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Read variables through `lookup` instead of the process environment.
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }
}

impl<F> ConfigPort for EnvConfig<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        let mut cfg = match self.var(CONFIG_PATH_VAR) {
            Some(path) => {
                let text = fs::read_to_string(&path)
                    .map_err(|e| ConfigError::Io(format!("{}: {}", path, e)))?;
                let cfg: ControllerConfig = serde_json::from_str(&text)
                    .map_err(|e| ConfigError::Corrupted(format!("{}: {}", path, e)))?;
                info!("EnvConfig: loaded {}", path);
                cfg
            }
            None => ControllerConfig::default(),
        };

        if let Some(device) = self.var(DEVICE_PATH_VAR) {
            info!("EnvConfig: device path from {}", DEVICE_PATH_VAR);
            cfg.device_path = device;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
