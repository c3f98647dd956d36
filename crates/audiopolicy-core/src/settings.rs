//! Ringer mode, audio parameters, microphone mute and audio scene

use crate::error::PolicyError;
use crate::notifier::{EventNotifier, PolicyEvent};
use crate::store::PolicyStore;
use crate::types::{AudioScene, RingerMode};
use crate::Result;

/// Process-wide settings that are not tied to a stream category
#[derive(Debug, Clone)]
pub struct SettingsController {
    store: PolicyStore,
    notifier: EventNotifier,
}

impl SettingsController {
    pub fn new(store: PolicyStore, notifier: EventNotifier) -> Self {
        Self { store, notifier }
    }

    /// Set the ringer mode and dispatch `ringerModeChange`
    pub fn set_ringer_mode(&self, mode: RingerMode) -> Result<()> {
        self.store.write(|state| state.ringer_mode = mode)?;
        // Unordered against concurrent setters, as for volume events
        tracing::info!("Ringer mode set to {}", mode);
        self.notifier.dispatch(&PolicyEvent::RingerModeChange(mode))?;
        Ok(())
    }

    pub fn get_ringer_mode(&self) -> Result<RingerMode> {
        self.store.read(|state| state.ringer_mode)
    }

    /// Store an opaque parameter. Key and value are kept exactly as given.
    pub fn set_audio_parameter(&self, key: &str, value: &str) -> Result<()> {
        self.store.write(|state| {
            state.parameters.insert(key.to_string(), value.to_string());
        })?;
        tracing::debug!("Audio parameter '{}' set ({} bytes)", key, value.len());
        Ok(())
    }

    /// Fails with `ParameterNotFound` for a key that was never set
    pub fn get_audio_parameter(&self, key: &str) -> Result<String> {
        self.store
            .read(|state| state.parameters.get(key).cloned())?
            .ok_or_else(|| PolicyError::ParameterNotFound(key.to_string()))
    }

    pub fn set_microphone_mute(&self, muted: bool) -> Result<()> {
        self.store.write(|state| state.microphone_muted = muted)?;
        tracing::debug!("Microphone muted: {}", muted);
        Ok(())
    }

    pub fn is_microphone_mute(&self) -> Result<bool> {
        self.store.read(|state| state.microphone_muted)
    }

    pub fn set_audio_scene(&self, scene: AudioScene) -> Result<()> {
        self.store.write(|state| state.audio_scene = scene)?;
        tracing::info!("Audio scene set to {}", scene);
        Ok(())
    }

    pub fn get_audio_scene(&self) -> Result<AudioScene> {
        self.store.read(|state| state.audio_scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::EventKind;
    use audiopolicy_config::PolicyConfig;
    use std::sync::{Arc, Mutex};

    const LONG_VALUE: &str =
        "28374837458743875804735081439085918459801437584738967509184509813904850914375904790589104801843";

    fn settings() -> SettingsController {
        let store = PolicyStore::from_config(&PolicyConfig::default()).unwrap();
        SettingsController::new(store, EventNotifier::new())
    }

    #[test]
    fn test_ringer_mode_round_trip() {
        let settings = settings();
        for mode in RingerMode::ALL {
            settings.set_ringer_mode(*mode).unwrap();
            assert_eq!(settings.get_ringer_mode().unwrap(), *mode);
        }
    }

    #[test]
    fn test_ringer_mode_event_per_call() {
        let settings = settings();
        let modes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&modes);
        settings
            .notifier
            .subscribe(EventKind::RingerModeChange, move |event| {
                if let PolicyEvent::RingerModeChange(mode) = event {
                    sink.lock().unwrap().push(*mode);
                }
            })
            .unwrap();

        settings.set_ringer_mode(RingerMode::Silent).unwrap();
        settings.set_ringer_mode(RingerMode::Silent).unwrap();
        settings.set_ringer_mode(RingerMode::Normal).unwrap();

        assert_eq!(
            *modes.lock().unwrap(),
            vec![RingerMode::Silent, RingerMode::Silent, RingerMode::Normal]
        );
    }

    #[test]
    fn test_parameters_round_trip_exactly() {
        let settings = settings();
        let cases = [
            ("PBits per sample", "8 bit"),
            ("PNumber", "4800"),
            ("PLNumber", LONG_VALUE),
            ("PDecimal", "10.000000234324324324"),
            ("1212", "PPNumber"),
            ("PSpecial", "[]\\:\";<>?,./~!@#$%^*()_+-={}|"),
            ("Special", "~!@#$%^*()_+-={}|[]\\:\";<>?,./"),
            ("PEmpty", ""),
            ("PPadded", "  spaced  "),
        ];

        for (key, value) in cases {
            settings.set_audio_parameter(key, value).unwrap();
        }
        for (key, value) in cases {
            assert_eq!(settings.get_audio_parameter(key).unwrap(), value);
        }
    }

    #[test]
    fn test_parameter_overwrite() {
        let settings = settings();
        settings.set_audio_parameter("k", "v1").unwrap();
        assert_eq!(settings.get_audio_parameter("k").unwrap(), "v1");
        settings.set_audio_parameter("k", "v2").unwrap();
        assert_eq!(settings.get_audio_parameter("k").unwrap(), "v2");
    }

    #[test]
    fn test_unknown_parameter() {
        let settings = settings();
        let err = settings.get_audio_parameter("never-set").unwrap_err();
        assert!(matches!(err, PolicyError::ParameterNotFound(ref key) if key == "never-set"));
        // deterministic on repeat
        assert!(settings.get_audio_parameter("never-set").is_err());
    }

    #[test]
    fn test_microphone_mute() {
        let settings = settings();
        assert!(!settings.is_microphone_mute().unwrap());
        settings.set_microphone_mute(true).unwrap();
        assert!(settings.is_microphone_mute().unwrap());
        settings.set_microphone_mute(false).unwrap();
        assert!(!settings.is_microphone_mute().unwrap());
    }

    #[test]
    fn test_audio_scene() {
        let settings = settings();
        assert_eq!(settings.get_audio_scene().unwrap(), AudioScene::Default);
        settings.set_audio_scene(AudioScene::VoiceChat).unwrap();
        assert_eq!(settings.get_audio_scene().unwrap(), AudioScene::VoiceChat);
        settings.set_audio_scene(AudioScene::Ringing).unwrap();
        assert_eq!(settings.get_audio_scene().unwrap(), AudioScene::Ringing);
    }
}
