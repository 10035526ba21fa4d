//! # Configuration
//!
//! Settings live in a single TOML file, by default
//! `~/.config/padmonitor/config.toml`. The `PADMONITOR_CONFIG` environment
//! variable points at a different file.
//!
//! A missing file is written out with defaults so users have something to
//! edit. A file that exists but does not parse or validate is reported as an
//! error instead of being silently replaced.

use crate::controller::ControllerSettings;
use crate::monitor::MonitorSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/padmonitor";
const CONFIG_FILE: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "PADMONITOR_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerSettings,
    pub monitor: MonitorSettings,
}

impl Config {
    /// Rejects values the tick loop or the normalizer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let normalizer = &self.controller.normalizer;

        if !(0.0..1.0).contains(&normalizer.deadzone) {
            return Err(ConfigError::Invalid {
                field: "controller.normalizer.deadzone",
                reason: format!("{} is outside [0, 1)", normalizer.deadzone),
            });
        }
        if !(0.0..=1.0).contains(&normalizer.trigger_digital_threshold) {
            return Err(ConfigError::Invalid {
                field: "controller.normalizer.trigger_digital_threshold",
                reason: format!(
                    "{} is outside [0, 1]",
                    normalizer.trigger_digital_threshold
                ),
            });
        }

        let non_zero = [
            ("controller.poll_interval_ms", self.controller.poll_interval_ms),
            ("controller.idle_interval_ms", self.controller.idle_interval_ms),
            ("controller.event_buffer", self.controller.event_buffer as u64),
            ("monitor.summary_interval_ms", self.monitor.summary_interval_ms),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Reads and validates the config at `path`, creating it with defaults
    /// when it does not exist yet.
    pub async fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| io_error(path, source))?;

        if !exists {
            warn!(
                "Config file {} does not exist, writing defaults",
                path.display()
            );
            let config = Config::default();
            config.save(path).await?;
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| io_error(path, source))?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| io_error(path, source))?;

        debug!("Config written to {}", path.display());
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Location of the config file: `$PADMONITOR_CONFIG` or the default under home.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let mut path = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    Ok(path)
}
