//! Audio manager handle
//!
//! Bundles the controllers over one shared store and notifier. Every handle
//! obtained from [`AudioManager::handle`] (or by cloning) observes the same
//! state and the same listener registry.

use crate::interrupt::InterruptManager;
use crate::notifier::{EventKind, EventNotifier, ListenerId, PolicyEvent};
use crate::routing::DeviceRouter;
use crate::settings::SettingsController;
use crate::store::PolicyStore;
use crate::types::{DeviceChangeAction, RingerMode, VolumeEvent};
use crate::volume::VolumeController;
use crate::Result;
use audiopolicy_config::PolicyConfig;

/// Process-wide audio policy handle
#[derive(Debug, Clone)]
pub struct AudioManager {
    store: PolicyStore,
    notifier: EventNotifier,
    pub volume: VolumeController,
    pub routing: DeviceRouter,
    pub settings: SettingsController,
    pub interrupts: InterruptManager,
}

impl AudioManager {
    /// Fresh notifier and focus stack over `store`. Further handles come
    /// from [`AudioManager::handle`] so they share both.
    fn new(store: PolicyStore) -> Self {
        let notifier = EventNotifier::new();
        Self {
            volume: VolumeController::new(store.clone(), notifier.clone()),
            routing: DeviceRouter::new(store.clone(), notifier.clone()),
            settings: SettingsController::new(store.clone(), notifier.clone()),
            interrupts: InterruptManager::new(),
            store,
            notifier,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        let manager = Self::new(PolicyStore::from_config(config)?);
        tracing::info!(
            "Audio policy initialized: {} device(s), {} parameter(s)",
            config.devices.len(),
            config.parameters.len()
        );
        Ok(manager)
    }

    /// Another handle onto the same policy
    pub fn handle(&self) -> Self {
        self.clone()
    }

    /// True when both handles observe the same state
    pub fn shares_store_with(&self, other: &AudioManager) -> bool {
        self.store.same_store(&other.store)
    }

    /// Register a raw listener for `kind`
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Result<ListenerId>
    where
        F: Fn(&PolicyEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(kind, listener)
    }

    pub fn on_volume_change<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&VolumeEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(EventKind::VolumeChange, move |event| {
            if let PolicyEvent::VolumeChange(volume) = event {
                listener(volume);
            }
        })
    }

    pub fn on_ringer_mode_change<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(RingerMode) + Send + Sync + 'static,
    {
        self.notifier.subscribe(EventKind::RingerModeChange, move |event| {
            if let PolicyEvent::RingerModeChange(mode) = event {
                listener(*mode);
            }
        })
    }

    pub fn on_device_change<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&DeviceChangeAction) + Send + Sync + 'static,
    {
        self.notifier.subscribe(EventKind::DeviceChange, move |event| {
            if let PolicyEvent::DeviceChange(action) = event {
                listener(action);
            }
        })
    }

    /// Remove one listener, or all listeners of `kind` when `id` is `None`
    pub fn off(&self, kind: EventKind, id: Option<ListenerId>) -> Result<usize> {
        self.notifier.unsubscribe(kind, id)
    }

    /// Snapshot the live state as a configuration
    pub fn export_config(&self) -> Result<PolicyConfig> {
        self.store.export_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamCategory;
    use std::sync::{Arc, Mutex};

    fn manager() -> AudioManager {
        AudioManager::from_config(&PolicyConfig::default()).unwrap()
    }

    #[test]
    fn test_handles_share_state() {
        let first = manager();
        let second = first.handle();
        assert!(first.shares_store_with(&second));

        first.volume.set_volume(StreamCategory::Media, 4).unwrap();
        assert_eq!(second.volume.get_volume(StreamCategory::Media).unwrap(), 4);

        let other = manager();
        assert!(!first.shares_store_with(&other));
        assert_ne!(other.volume.get_volume(StreamCategory::Media).unwrap(), 4);
    }

    #[test]
    fn test_listener_on_one_handle_sees_other() {
        let first = manager();
        let second = first.handle();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        first
            .on_ringer_mode_change(move |mode| sink.lock().unwrap().push(mode))
            .unwrap();

        second.settings.set_ringer_mode(RingerMode::Vibrate).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![RingerMode::Vibrate]);
    }

    #[test]
    fn test_separate_managers_keep_separate_listeners() {
        let first = manager();
        let second = manager();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        first
            .on_volume_change(move |_| *counter.lock().unwrap() += 1)
            .unwrap();

        second.volume.set_volume(StreamCategory::Media, 2).unwrap();
        first.handle().volume.set_volume(StreamCategory::Media, 3).unwrap();
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_off_stops_delivery() {
        let manager = manager();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let id = manager
            .on_volume_change(move |_| *counter.lock().unwrap() += 1)
            .unwrap();

        manager.volume.set_volume(StreamCategory::Media, 3).unwrap();
        assert_eq!(manager.off(EventKind::VolumeChange, Some(id)).unwrap(), 1);
        manager.volume.set_volume(StreamCategory::Media, 6).unwrap();
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_export_reflects_changes() {
        let manager = manager();
        manager.volume.set_volume(StreamCategory::Ringtone, 11).unwrap();
        manager.settings.set_audio_parameter("PNumber", "4800").unwrap();

        let exported = manager.export_config().unwrap();
        assert_eq!(exported.streams["ringtone"].default_volume, 11);
        assert_eq!(exported.parameters["PNumber"], "4800");
    }
}
