//! Configuration management for the audio policy service
//!
//! Holds stream volume bounds, the device inventory and the initial policy
//! settings. Files are TOML; scalar policy settings can be overridden from
//! `AUDIOPOLICY_*` environment variables.

mod devices;
mod streams;

pub use devices::{DeviceEntry, default_devices};
pub use streams::{StreamProfile, default_streams};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/audiopolicy";
pub const USER_CONFIG_DIR: &str = "/var/lib/audiopolicy";
pub const CONFIG_FILE: &str = "policy.toml";

/// Prefix for environment overrides (`AUDIOPOLICY_RINGER_MODE=silent`)
pub const ENV_PREFIX: &str = "AUDIOPOLICY";

/// Process-wide policy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySettings {
    /// silent, vibrate or normal
    #[serde(default = "default_ringer_mode")]
    pub ringer_mode: String,

    /// default, ringing, phone_call or voice_chat
    #[serde(default = "default_audio_scene")]
    pub audio_scene: String,

    #[serde(default)]
    pub microphone_muted: bool,

    /// Activating one switchable output deactivates the others
    #[serde(default)]
    pub exclusive_active_devices: bool,
}

fn default_ringer_mode() -> String {
    "normal".to_string()
}

fn default_audio_scene() -> String {
    "default".to_string()
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            ringer_mode: default_ringer_mode(),
            audio_scene: default_audio_scene(),
            microphone_muted: false,
            exclusive_active_devices: false,
        }
    }
}

/// Main audio policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub policy: PolicySettings,

    #[serde(default = "default_streams")]
    pub streams: BTreeMap<String, StreamProfile>,

    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceEntry>,

    /// Opaque key/value audio parameters, preserved byte for byte
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            policy: PolicySettings::default(),
            streams: default_streams(),
            devices: default_devices(),
            parameters: BTreeMap::new(),
        }
    }
}

/// Scalar overrides read from the environment
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    ringer_mode: Option<String>,
    audio_scene: Option<String>,
    microphone_muted: Option<bool>,
    exclusive_active_devices: Option<bool>,
}

impl PolicyConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try user config first, then system config
        let user_config = Path::new(USER_CONFIG_DIR).join(CONFIG_FILE);
        if user_config.exists() {
            return Self::load(&user_config);
        }

        let system_config = Path::new(CONFIG_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Self::load(&system_config);
        }

        tracing::warn!("No policy configuration found, using defaults");
        Ok(Self::default())
    }

    /// Load a base file and deep-merge an optional overlay on top of it
    pub fn load_layered(base: &Path, overlay: &Path) -> Result<Self, ConfigError> {
        if !base.exists() {
            return Err(ConfigError::NotFound(base.to_path_buf()));
        }
        let mut merged: toml::Value = toml::from_str(&std::fs::read_to_string(base)?)?;

        if overlay.exists() {
            let layer: toml::Value = toml::from_str(&std::fs::read_to_string(overlay)?)?;
            merge_toml(&mut merged, layer);
            tracing::debug!("Merged overlay {}", overlay.display());
        }

        let config: Self = merged.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `AUDIOPOLICY_*` overrides to the `[policy]` table
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn apply_env_source(&mut self, source: config::Environment) -> Result<(), ConfigError> {
        let overrides: EnvOverrides = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        if let Some(mode) = overrides.ringer_mode {
            tracing::debug!("Ringer mode overridden from environment: {}", mode);
            self.policy.ringer_mode = mode;
        }
        if let Some(scene) = overrides.audio_scene {
            self.policy.audio_scene = scene;
        }
        if let Some(muted) = overrides.microphone_muted {
            self.policy.microphone_muted = muted;
        }
        if let Some(exclusive) = overrides.exclusive_active_devices {
            self.policy.exclusive_active_devices = exclusive;
        }
        Ok(())
    }

    /// Check stream ranges and device roles
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, profile) in &self.streams {
            profile.validate(name)?;
        }
        for device in &self.devices {
            if device.role != "input" && device.role != "output" {
                return Err(ConfigError::Invalid(format!(
                    "device '{}': unknown role '{}'",
                    device.kind, device.role
                )));
            }
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Policy configuration saved to {}", path.display());
        Ok(())
    }

    /// Save to default user configuration location
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let user_config = Path::new(USER_CONFIG_DIR).join(CONFIG_FILE);
        self.save(&user_config)
    }
}

/// Helper function to merge TOML values
pub fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
