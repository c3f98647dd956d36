//! Policy error taxonomy

use crate::types::{ActiveDeviceType, StreamCategory};
use audiopolicy_config::ConfigError;
use thiserror::Error;

/// Diagnostic carried by every rejected volume request
pub const VOLUME_ERROR_MESSAGE: &str = "Error, Operation not supported or Failed";

#[derive(Debug, Error)]
pub enum PolicyError {
    /// Volume outside the category's range; stored state is untouched
    #[error("Error, Operation not supported or Failed")]
    InvalidArgument {
        category: StreamCategory,
        volume: i32,
    },

    #[error("Audio parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Device not connected: {0:?}")]
    DeviceUnavailable(ActiveDeviceType),

    #[error("Unknown {kind} value: {raw}")]
    UnknownValue { kind: &'static str, raw: i32 },

    #[error("Unknown {kind} name: {name}")]
    UnknownName { kind: &'static str, name: String },

    #[error("Stream category not configured: {0:?}")]
    UnknownStream(StreamCategory),

    #[error("Invalid policy configuration: {0}")]
    InvalidConfig(String),

    #[error("Policy state lock poisoned")]
    StatePoisoned,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PolicyError {
    /// True for range violations on volume requests
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PolicyError::InvalidArgument { .. })
    }
}
