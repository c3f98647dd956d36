//! Shared policy state
//!
//! One `PolicyState` lives behind an `Arc<RwLock<_>>`. Every controller and
//! every manager handle holds a clone of the same `PolicyStore`, so writes
//! through one handle are visible through all of them. Each operation runs
//! inside a single `read`/`write` closure and is therefore atomic.

use crate::error::PolicyError;
use crate::types::{
    AudioScene, DeviceDescriptor, DeviceRole, DeviceType, RingerMode, StreamCategory, VolumeRange,
};
use crate::Result;
use audiopolicy_config::{DeviceEntry, PolicyConfig, PolicySettings, StreamProfile};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Volume and mute state of one stream category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamState {
    pub range: VolumeRange,
    pub level: i32,
    pub muted: bool,
    /// Live playback on this category
    pub active: bool,
}

/// One entry in the device inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub descriptor: DeviceDescriptor,
    pub connected: bool,
    pub active: bool,
}

/// Complete audio policy state
#[derive(Debug)]
pub struct PolicyState {
    pub streams: HashMap<StreamCategory, StreamState>,
    pub ringer_mode: RingerMode,
    pub audio_scene: AudioScene,
    pub microphone_muted: bool,
    pub devices: Vec<DeviceState>,
    pub parameters: HashMap<String, String>,
    pub exclusive_active_devices: bool,
}

impl PolicyState {
    /// Build state from configuration, filling unlisted categories with built-in profiles
    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        config.validate()?;

        let mut profiles = audiopolicy_config::default_streams();
        for (name, profile) in &config.streams {
            profiles.insert(name.clone(), *profile);
        }

        let mut streams = HashMap::new();
        for (name, profile) in &profiles {
            let category = StreamCategory::from_name(name)
                .ok_or_else(|| PolicyError::InvalidConfig(format!("unknown stream '{}'", name)))?;
            streams.insert(category, stream_state(profile));
        }

        let mut devices: Vec<DeviceState> = Vec::with_capacity(config.devices.len());
        for entry in &config.devices {
            let device = device_state(entry)?;
            if devices.iter().any(|d| d.descriptor == device.descriptor) {
                return Err(PolicyError::InvalidConfig(format!(
                    "duplicate device '{} {}'",
                    entry.role, entry.kind
                )));
            }
            devices.push(device);
        }

        let ringer_mode = RingerMode::from_name(&config.policy.ringer_mode).ok_or_else(|| {
            PolicyError::InvalidConfig(format!("unknown ringer mode '{}'", config.policy.ringer_mode))
        })?;
        let audio_scene = AudioScene::from_name(&config.policy.audio_scene).ok_or_else(|| {
            PolicyError::InvalidConfig(format!("unknown audio scene '{}'", config.policy.audio_scene))
        })?;

        Ok(Self {
            streams,
            ringer_mode,
            audio_scene,
            microphone_muted: config.policy.microphone_muted,
            devices,
            parameters: config
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            exclusive_active_devices: config.policy.exclusive_active_devices,
        })
    }

    pub fn stream(&self, category: StreamCategory) -> Result<&StreamState> {
        self.streams
            .get(&category)
            .ok_or(PolicyError::UnknownStream(category))
    }

    pub fn stream_mut(&mut self, category: StreamCategory) -> Result<&mut StreamState> {
        self.streams
            .get_mut(&category)
            .ok_or(PolicyError::UnknownStream(category))
    }

    pub fn device(&self, descriptor: DeviceDescriptor) -> Option<&DeviceState> {
        self.devices.iter().find(|d| d.descriptor == descriptor)
    }

    pub fn device_mut(&mut self, descriptor: DeviceDescriptor) -> Option<&mut DeviceState> {
        self.devices.iter_mut().find(|d| d.descriptor == descriptor)
    }

    /// Render the live state as a configuration for persistence
    pub fn to_config(&self) -> PolicyConfig {
        let streams: BTreeMap<String, StreamProfile> = self
            .streams
            .iter()
            .map(|(category, state)| {
                (
                    category.name().to_string(),
                    StreamProfile {
                        min_volume: state.range.min,
                        max_volume: state.range.max,
                        default_volume: state.level,
                    },
                )
            })
            .collect();

        let devices = self
            .devices
            .iter()
            .map(|d| DeviceEntry {
                role: d.descriptor.role.name().to_string(),
                kind: d.descriptor.device_type.name().to_string(),
                connected: d.connected,
                active: d.active,
            })
            .collect();

        PolicyConfig {
            policy: PolicySettings {
                ringer_mode: self.ringer_mode.name().to_string(),
                audio_scene: self.audio_scene.name().to_string(),
                microphone_muted: self.microphone_muted,
                exclusive_active_devices: self.exclusive_active_devices,
            },
            streams,
            devices,
            parameters: self
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

fn stream_state(profile: &StreamProfile) -> StreamState {
    StreamState {
        range: VolumeRange::new(profile.min_volume, profile.max_volume),
        level: profile.default_volume,
        muted: false,
        active: false,
    }
}

fn device_state(entry: &DeviceEntry) -> Result<DeviceState> {
    let role = DeviceRole::from_name(&entry.role)
        .ok_or_else(|| PolicyError::InvalidConfig(format!("unknown device role '{}'", entry.role)))?;
    let device_type = match DeviceType::from_name(&entry.kind) {
        Some(DeviceType::Invalid) | None => {
            return Err(PolicyError::InvalidConfig(format!(
                "unknown device kind '{}'",
                entry.kind
            )));
        }
        Some(device_type) => device_type,
    };

    Ok(DeviceState {
        descriptor: DeviceDescriptor::new(role, device_type),
        connected: entry.connected,
        active: entry.active && entry.connected,
    })
}

/// Cloneable handle to the single shared policy state
#[derive(Debug, Clone)]
pub struct PolicyStore {
    state: Arc<RwLock<PolicyState>>,
}

impl PolicyStore {
    pub fn new(state: PolicyState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        Ok(Self::new(PolicyState::from_config(config)?))
    }

    /// Run `f` under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&PolicyState) -> R) -> Result<R> {
        let state = self.state.read().map_err(|_| PolicyError::StatePoisoned)?;
        Ok(f(&state))
    }

    /// Run `f` under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut PolicyState) -> R) -> Result<R> {
        let mut state = self.state.write().map_err(|_| PolicyError::StatePoisoned)?;
        Ok(f(&mut state))
    }

    /// Whether both handles refer to the same underlying state
    pub fn same_store(&self, other: &PolicyStore) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn export_config(&self) -> Result<PolicyConfig> {
        self.read(PolicyState::to_config)
    }
}
