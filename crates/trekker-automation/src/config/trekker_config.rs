use std::{fs, path::Path, path::PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::{AutomationConfig, PolicyConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not determine the config directory")]
    NoConfigDir,
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

const EXAMPLE_CONFIG: &str = r#"# trekker configuration

[automation]
walk_interval_ms = 1000
step = 50
cooldown_ms = 10000
stop_grace_ms = 2000

[policy]
hostile_creatures = ["badger", "bat", "bear", "boar", "lynx"]

[policy.curios.dandelion]
collectible = true
cost = 1
"#;

/// Top-level configuration, read once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrekkerConfig {
    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

impl TrekkerConfig {
    /// Default location: `<config dir>/trekker/config.toml`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "trekker").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(target: "config", "Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.automation.validate()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml_string()?)?;
        info!(target: "config", "Saved config to {}", path.display());
        Ok(())
    }

    /// The effective config as TOML, defaults filled in
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Sample config written when none exists yet
    pub fn example_toml() -> &'static str {
        EXAMPLE_CONFIG
    }

    /// Write the sample config to `path`, creating parent directories
    pub fn write_example(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, EXAMPLE_CONFIG)?;
        info!(target: "config", "Created example config at {}", path.display());
        Ok(())
    }
}
