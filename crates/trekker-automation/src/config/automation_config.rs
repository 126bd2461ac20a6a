use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigError;

/// Timing and movement constants for autowalk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Time between movement commands in milliseconds (default: 1000)
    #[serde(default = "default_walk_interval_ms")]
    pub walk_interval_ms: u64,

    /// Distance added to both x and y on each movement (default: 50)
    #[serde(default = "default_step")]
    pub step: i32,

    /// Delay between a reaction finishing and autowalk resuming, in milliseconds (default: 10000)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// How long stopping waits for an in-flight movement, in milliseconds (default: 2000)
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

fn default_walk_interval_ms() -> u64 {
    1000
}

fn default_step() -> i32 {
    50
}

fn default_cooldown_ms() -> u64 {
    10_000
}

fn default_stop_grace_ms() -> u64 {
    2000
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            walk_interval_ms: default_walk_interval_ms(),
            step: default_step(),
            cooldown_ms: default_cooldown_ms(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

impl AutomationConfig {
    pub fn walk_interval(&self) -> Duration {
        Duration::from_millis(self.walk_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.walk_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "automation.walk_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
