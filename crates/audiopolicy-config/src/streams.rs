//! Stream volume profiles
//!
//! Each stream category gets its own volume range and boot-time level.
//! Categories are keyed by their snake_case name (`media`, `ringtone`,
//! `voice_call`, `voice_assistant`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ConfigError;

/// Volume bounds and initial level for one stream category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProfile {
    /// Lowest accepted volume level
    #[serde(default)]
    pub min_volume: i32,
    /// Highest accepted volume level
    #[serde(default = "default_max_volume")]
    pub max_volume: i32,
    /// Level applied when the policy store is built
    #[serde(default = "default_level")]
    pub default_volume: i32,
}

fn default_max_volume() -> i32 {
    15
}

fn default_level() -> i32 {
    7
}

impl Default for StreamProfile {
    fn default() -> Self {
        Self {
            min_volume: 0,
            max_volume: default_max_volume(),
            default_volume: default_level(),
        }
    }
}

impl StreamProfile {
    /// Check that the range is well formed and holds the default level
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.min_volume < 0 {
            return Err(ConfigError::Invalid(format!(
                "stream '{}': min_volume {} is negative",
                name, self.min_volume
            )));
        }
        if self.min_volume > self.max_volume {
            return Err(ConfigError::Invalid(format!(
                "stream '{}': min_volume {} exceeds max_volume {}",
                name, self.min_volume, self.max_volume
            )));
        }
        if !(self.min_volume..=self.max_volume).contains(&self.default_volume) {
            return Err(ConfigError::Invalid(format!(
                "stream '{}': default_volume {} outside {}..={}",
                name, self.default_volume, self.min_volume, self.max_volume
            )));
        }
        Ok(())
    }
}

/// Built-in stream profiles
pub fn default_streams() -> BTreeMap<String, StreamProfile> {
    let mut streams = BTreeMap::new();
    streams.insert(
        "voice_call".to_string(),
        StreamProfile {
            default_volume: 9,
            ..StreamProfile::default()
        },
    );
    streams.insert("ringtone".to_string(), StreamProfile::default());
    streams.insert("media".to_string(), StreamProfile::default());
    streams.insert("voice_assistant".to_string(), StreamProfile::default());
    streams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_streams_cover_all_categories() {
        let streams = default_streams();
        for name in ["voice_call", "ringtone", "media", "voice_assistant"] {
            let profile = streams.get(name).unwrap();
            assert_eq!(profile.min_volume, 0);
            assert_eq!(profile.max_volume, 15);
            assert!(profile.validate(name).is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let profile = StreamProfile {
            min_volume: 10,
            max_volume: 5,
            default_volume: 7,
        };
        let err = profile.validate("media").unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_validate_rejects_default_outside_range() {
        let profile = StreamProfile {
            min_volume: 0,
            max_volume: 15,
            default_volume: 16,
        };
        assert!(profile.validate("ringtone").is_err());
    }

    #[test]
    fn test_validate_rejects_negative_min() {
        let profile = StreamProfile {
            min_volume: -1,
            max_volume: 15,
            default_volume: 0,
        };
        assert!(profile.validate("media").is_err());
    }

    #[test]
    fn test_partial_profile_uses_defaults() {
        let profile: StreamProfile = toml::from_str("max_volume = 10").unwrap();
        assert_eq!(profile.min_volume, 0);
        assert_eq!(profile.max_volume, 10);
        assert_eq!(profile.default_volume, 7);
    }
}
