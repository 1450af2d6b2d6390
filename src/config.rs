//! Configuration for the armband presentation controller.

use crate::core::debounce::DEFAULT_REFRACTORY_MS;
use crate::core::lock::{RepeatPolicy, DEFAULT_UNLOCK_WINDOW_MS};
use crate::session::connection::DEFAULT_LOW_BATTERY_PCT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Device identifier to pair with
    pub device_id: String,

    /// Refractory window for debouncing repeated poses (milliseconds)
    pub refractory_ms: u64,

    /// Inactivity window before the gesture gate re-locks (milliseconds)
    pub unlock_window_ms: u64,

    /// Whether a gesture may fire more than once per unlock cycle
    pub repeat_policy: RepeatPolicy,

    /// Whether to send haptic feedback pulses to the device
    pub haptics: bool,

    /// Battery percentage at or below which a warning is raised
    pub low_battery_warn_pct: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_id: "armband-0".to_string(),
            refractory_ms: DEFAULT_REFRACTORY_MS,
            unlock_window_ms: DEFAULT_UNLOCK_WINDOW_MS,
            repeat_policy: RepeatPolicy::OneShot,
            haptics: true,
            low_battery_warn_pct: DEFAULT_LOW_BATTERY_PCT,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("armdeck")
            .join("config.json")
    }

    /// Reject values the state machines cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unlock_window_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "unlock_window_ms must be greater than zero".to_string(),
            ));
        }
        if self.low_battery_warn_pct > 100 {
            return Err(ConfigError::InvalidValue(
                "low_battery_warn_pct must be 0-100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
