//! Mock platform for running the policy without audio hardware
//!
//! Profiles provide a device inventory typical of a device class, and
//! [`MockRenderer`] stands in for a playback client: it holds audio focus
//! while playing and reports its stream as active.
//!
//! # Usage
//!
//! ```no_run
//! use audiopolicy_core::mock::{MockAudioSystem, MockProfile, MockRenderer};
//! use audiopolicy_core::StreamCategory;
//!
//! let system = MockAudioSystem::new(MockProfile::Phone).unwrap();
//! let music = MockRenderer::media(system.manager());
//! music.start().unwrap();
//! assert!(system.manager().volume.is_active(StreamCategory::Media).unwrap());
//! ```

use crate::manager::AudioManager;
use crate::notifier::ListenerId;
use crate::types::{
    AudioInterrupt, ContentType, InterruptActionType, InterruptHint, InterruptType,
    StreamCategory, StreamUsage,
};
use crate::volume::VolumeController;
use crate::{PolicyError, Result};
use audiopolicy_config::{DeviceEntry, PolicyConfig, StreamProfile};
use std::sync::{Arc, Mutex};

/// Environment variable selecting the mock profile
pub const MOCK_PROFILE_ENV: &str = "AUDIOPOLICY_MOCK_PROFILE";

/// Pre-defined device classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockProfile {
    /// Handset: earpiece, loudspeaker, SCO headset, wired jack
    Phone,
    /// Tablet: loudspeaker, A2DP, headphone jack
    Tablet,
    /// Smart speaker: loudspeaker and far-field mic only
    SmartSpeaker,
    /// Desktop development host
    Desktop,
}

impl MockProfile {
    /// Policy configuration for this profile
    pub fn to_config(self) -> PolicyConfig {
        let mut config = PolicyConfig::default();
        match self {
            MockProfile::Phone => {}
            MockProfile::Tablet => {
                config.devices = vec![
                    DeviceEntry::new("output", "speaker").active(),
                    DeviceEntry::new("output", "bluetooth_a2dp").disconnected(),
                    DeviceEntry::new("output", "bluetooth_sco").disconnected(),
                    DeviceEntry::new("output", "wired_headphones").disconnected(),
                    DeviceEntry::new("input", "mic"),
                ];
            }
            MockProfile::SmartSpeaker => {
                config.devices = vec![
                    DeviceEntry::new("output", "speaker").active(),
                    DeviceEntry::new("input", "mic"),
                ];
                config.streams.insert(
                    "voice_assistant".into(),
                    StreamProfile {
                        min_volume: 1,
                        max_volume: 15,
                        default_volume: 10,
                    },
                );
                config.policy.exclusive_active_devices = true;
            }
            MockProfile::Desktop => {
                config.devices = vec![
                    DeviceEntry::new("output", "speaker").active(),
                    DeviceEntry::new("output", "wired_headphones"),
                    DeviceEntry::new("output", "usb_headset").disconnected(),
                    DeviceEntry::new("input", "mic"),
                ];
            }
        }
        config
    }

    pub fn name(self) -> &'static str {
        match self {
            MockProfile::Phone => "phone",
            MockProfile::Tablet => "tablet",
            MockProfile::SmartSpeaker => "smart_speaker",
            MockProfile::Desktop => "desktop",
        }
    }

    /// Get mock profile from name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "phone" | "handset" => Some(MockProfile::Phone),
            "tablet" => Some(MockProfile::Tablet),
            "smart_speaker" | "smartspeaker" | "speaker" => Some(MockProfile::SmartSpeaker),
            "desktop" | "pc" => Some(MockProfile::Desktop),
            _ => None,
        }
    }

    /// List all available mock profiles
    pub fn all() -> &'static [MockProfile] {
        &[
            MockProfile::Phone,
            MockProfile::Tablet,
            MockProfile::SmartSpeaker,
            MockProfile::Desktop,
        ]
    }

    /// Profile named by `AUDIOPOLICY_MOCK_PROFILE`, if set and known
    pub fn from_env() -> Option<Self> {
        std::env::var(MOCK_PROFILE_ENV)
            .ok()
            .and_then(|name| MockProfile::from_name(&name))
    }
}

/// A policy instance built from a mock profile
#[derive(Debug, Clone)]
pub struct MockAudioSystem {
    profile: MockProfile,
    manager: AudioManager,
}

impl MockAudioSystem {
    pub fn new(profile: MockProfile) -> Result<Self> {
        let manager = AudioManager::from_config(&profile.to_config())?;
        tracing::debug!("Mock audio system created for {}", profile.name());
        Ok(Self { profile, manager })
    }

    /// Profile from the environment, falling back to a phone
    pub fn from_env() -> Result<Self> {
        Self::new(MockProfile::from_env().unwrap_or(MockProfile::Phone))
    }

    pub fn profile(&self) -> MockProfile {
        self.profile
    }

    pub fn manager(&self) -> &AudioManager {
        &self.manager
    }
}

/// Simulated playback client
#[derive(Debug)]
pub struct MockRenderer {
    manager: AudioManager,
    category: StreamCategory,
    interrupt: AudioInterrupt,
    focus: Arc<Mutex<Option<ListenerId>>>,
}

impl MockRenderer {
    pub fn new(manager: &AudioManager, category: StreamCategory, interrupt: AudioInterrupt) -> Self {
        Self {
            manager: manager.handle(),
            category,
            interrupt,
            focus: Arc::new(Mutex::new(None)),
        }
    }

    /// Music player on the media stream
    pub fn media(manager: &AudioManager) -> Self {
        Self::new(
            manager,
            StreamCategory::Media,
            AudioInterrupt::new(StreamUsage::Media, ContentType::Music),
        )
    }

    /// Voice call on the voice-call stream
    pub fn voice_call(manager: &AudioManager) -> Self {
        Self::new(
            manager,
            StreamCategory::VoiceCall,
            AudioInterrupt::new(StreamUsage::VoiceCommunication, ContentType::Speech),
        )
    }

    /// Incoming-call ring on the ringtone stream
    pub fn ringtone(manager: &AudioManager) -> Self {
        Self::new(
            manager,
            StreamCategory::Ringtone,
            AudioInterrupt::new(StreamUsage::NotificationRingtone, ContentType::Ringtone),
        )
    }

    /// Request focus and start playing. Pause and stop hints silence the
    /// stream, resume brings it back. A stop hint also drops the focus
    /// request, so the next `start` asks for focus again.
    pub fn start(&self) -> Result<()> {
        let mut focus = self.focus.lock().map_err(|_| PolicyError::StatePoisoned)?;
        if focus.is_some() {
            return Ok(());
        }

        let volume = self.manager.volume.clone();
        let category = self.category;
        let slot = Arc::clone(&self.focus);
        let id = self
            .manager
            .interrupts
            .request_focus(self.interrupt, move |action| {
                let playing = match (action.action_type, action.interrupt_type, action.hint) {
                    (InterruptActionType::Activated, _, _) => action.activated,
                    (_, Some(InterruptType::Begin), Some(InterruptHint::Pause | InterruptHint::Stop)) => {
                        Some(false)
                    }
                    (_, Some(InterruptType::End), Some(InterruptHint::Resume)) => Some(true),
                    _ => None,
                };
                if let Some(playing) = playing {
                    apply_playback(&volume, category, playing);
                }
                if action.hint == Some(InterruptHint::Stop) {
                    match slot.lock() {
                        Ok(mut focus) => *focus = None,
                        Err(_) => tracing::warn!("Mock renderer focus slot poisoned"),
                    }
                }
            })?;
        *focus = Some(id);
        Ok(())
    }

    /// Stop playing and give focus back
    pub fn stop(&self) -> Result<()> {
        let id = self
            .focus
            .lock()
            .map_err(|_| PolicyError::StatePoisoned)?
            .take();
        if let Some(id) = id {
            self.manager.interrupts.abandon_focus(id)?;
            self.manager.volume.set_stream_active(self.category, false)?;
        }
        Ok(())
    }

    pub fn is_playing(&self) -> Result<bool> {
        self.manager.volume.is_active(self.category)
    }
}

fn apply_playback(volume: &VolumeController, category: StreamCategory, playing: bool) {
    if let Err(err) = volume.set_stream_active(category, playing) {
        tracing::warn!("Mock renderer could not update {}: {}", category, err);
    }
}
