//! Calling conventions
//!
//! The controllers are synchronous. [`AsyncAudioManager`] exposes every
//! operation as a future and [`CallbackAudioManager`] as a call taking a
//! completion callback. Both wrap the same [`AudioManager`] handle, so they
//! report identical outcomes, and listeners have run by the time either
//! settles.

use crate::manager::AudioManager;
use crate::types::{
    ActiveDeviceType, AudioScene, DeviceDescriptor, DeviceFlag, RingerMode, StreamCategory,
};
use crate::Result;

/// Future-returning facade
#[derive(Debug, Clone)]
pub struct AsyncAudioManager {
    inner: AudioManager,
}

impl AsyncAudioManager {
    pub fn new(manager: AudioManager) -> Self {
        Self { inner: manager }
    }

    /// Underlying synchronous handle, e.g. for subscribing listeners
    pub fn manager(&self) -> &AudioManager {
        &self.inner
    }

    pub async fn set_volume(&self, category: StreamCategory, volume: i32) -> Result<()> {
        self.inner.volume.set_volume(category, volume)
    }

    pub async fn get_volume(&self, category: StreamCategory) -> Result<i32> {
        self.inner.volume.get_volume(category)
    }

    pub async fn get_min_volume(&self, category: StreamCategory) -> Result<i32> {
        self.inner.volume.get_min_volume(category)
    }

    pub async fn get_max_volume(&self, category: StreamCategory) -> Result<i32> {
        self.inner.volume.get_max_volume(category)
    }

    pub async fn volume_up(&self, category: StreamCategory) -> Result<i32> {
        self.inner.volume.volume_up(category)
    }

    pub async fn volume_down(&self, category: StreamCategory) -> Result<i32> {
        self.inner.volume.volume_down(category)
    }

    pub async fn mute(&self, category: StreamCategory, muted: bool) -> Result<()> {
        self.inner.volume.mute(category, muted)
    }

    pub async fn is_mute(&self, category: StreamCategory) -> Result<bool> {
        self.inner.volume.is_mute(category)
    }

    pub async fn is_active(&self, category: StreamCategory) -> Result<bool> {
        self.inner.volume.is_active(category)
    }

    pub async fn get_devices(&self, flag: DeviceFlag) -> Result<Vec<DeviceDescriptor>> {
        self.inner.routing.get_devices(flag)
    }

    pub async fn set_device_active(&self, device: ActiveDeviceType, active: bool) -> Result<()> {
        self.inner.routing.set_device_active(device, active)
    }

    pub async fn is_device_active(&self, device: ActiveDeviceType) -> Result<bool> {
        self.inner.routing.is_device_active(device)
    }

    pub async fn connect_device(&self, descriptor: DeviceDescriptor) -> Result<bool> {
        self.inner.routing.connect_device(descriptor)
    }

    pub async fn disconnect_device(&self, descriptor: DeviceDescriptor) -> Result<bool> {
        self.inner.routing.disconnect_device(descriptor)
    }

    pub async fn set_ringer_mode(&self, mode: RingerMode) -> Result<()> {
        self.inner.settings.set_ringer_mode(mode)
    }

    pub async fn get_ringer_mode(&self) -> Result<RingerMode> {
        self.inner.settings.get_ringer_mode()
    }

    pub async fn set_audio_parameter(&self, key: &str, value: &str) -> Result<()> {
        self.inner.settings.set_audio_parameter(key, value)
    }

    pub async fn get_audio_parameter(&self, key: &str) -> Result<String> {
        self.inner.settings.get_audio_parameter(key)
    }

    pub async fn set_microphone_mute(&self, muted: bool) -> Result<()> {
        self.inner.settings.set_microphone_mute(muted)
    }

    pub async fn is_microphone_mute(&self) -> Result<bool> {
        self.inner.settings.is_microphone_mute()
    }

    pub async fn set_audio_scene(&self, scene: AudioScene) -> Result<()> {
        self.inner.settings.set_audio_scene(scene)
    }

    pub async fn get_audio_scene(&self) -> Result<AudioScene> {
        self.inner.settings.get_audio_scene()
    }
}

/// Completion-callback facade. Each completion runs exactly once, before
/// the call returns.
#[derive(Debug, Clone)]
pub struct CallbackAudioManager {
    inner: AudioManager,
}

impl CallbackAudioManager {
    pub fn new(manager: AudioManager) -> Self {
        Self { inner: manager }
    }

    pub fn manager(&self) -> &AudioManager {
        &self.inner
    }

    pub fn set_volume<F>(&self, category: StreamCategory, volume: i32, done: F)
    where
        F: FnOnce(Result<()>),
    {
        done(self.inner.volume.set_volume(category, volume))
    }

    pub fn get_volume<F>(&self, category: StreamCategory, done: F)
    where
        F: FnOnce(Result<i32>),
    {
        done(self.inner.volume.get_volume(category))
    }

    pub fn get_min_volume<F>(&self, category: StreamCategory, done: F)
    where
        F: FnOnce(Result<i32>),
    {
        done(self.inner.volume.get_min_volume(category))
    }

    pub fn get_max_volume<F>(&self, category: StreamCategory, done: F)
    where
        F: FnOnce(Result<i32>),
    {
        done(self.inner.volume.get_max_volume(category))
    }

    pub fn volume_up<F>(&self, category: StreamCategory, done: F)
    where
        F: FnOnce(Result<i32>),
    {
        done(self.inner.volume.volume_up(category))
    }

    pub fn volume_down<F>(&self, category: StreamCategory, done: F)
    where
        F: FnOnce(Result<i32>),
    {
        done(self.inner.volume.volume_down(category))
    }

    pub fn mute<F>(&self, category: StreamCategory, muted: bool, done: F)
    where
        F: FnOnce(Result<()>),
    {
        done(self.inner.volume.mute(category, muted))
    }

    pub fn is_mute<F>(&self, category: StreamCategory, done: F)
    where
        F: FnOnce(Result<bool>),
    {
        done(self.inner.volume.is_mute(category))
    }

    pub fn is_active<F>(&self, category: StreamCategory, done: F)
    where
        F: FnOnce(Result<bool>),
    {
        done(self.inner.volume.is_active(category))
    }

    pub fn get_devices<F>(&self, flag: DeviceFlag, done: F)
    where
        F: FnOnce(Result<Vec<DeviceDescriptor>>),
    {
        done(self.inner.routing.get_devices(flag))
    }

    pub fn set_device_active<F>(&self, device: ActiveDeviceType, active: bool, done: F)
    where
        F: FnOnce(Result<()>),
    {
        done(self.inner.routing.set_device_active(device, active))
    }

    pub fn is_device_active<F>(&self, device: ActiveDeviceType, done: F)
    where
        F: FnOnce(Result<bool>),
    {
        done(self.inner.routing.is_device_active(device))
    }

    pub fn connect_device<F>(&self, descriptor: DeviceDescriptor, done: F)
    where
        F: FnOnce(Result<bool>),
    {
        done(self.inner.routing.connect_device(descriptor))
    }

    pub fn disconnect_device<F>(&self, descriptor: DeviceDescriptor, done: F)
    where
        F: FnOnce(Result<bool>),
    {
        done(self.inner.routing.disconnect_device(descriptor))
    }

    pub fn set_ringer_mode<F>(&self, mode: RingerMode, done: F)
    where
        F: FnOnce(Result<()>),
    {
        done(self.inner.settings.set_ringer_mode(mode))
    }

    pub fn get_ringer_mode<F>(&self, done: F)
    where
        F: FnOnce(Result<RingerMode>),
    {
        done(self.inner.settings.get_ringer_mode())
    }

    pub fn set_audio_parameter<F>(&self, key: &str, value: &str, done: F)
    where
        F: FnOnce(Result<()>),
    {
        done(self.inner.settings.set_audio_parameter(key, value))
    }

    pub fn get_audio_parameter<F>(&self, key: &str, done: F)
    where
        F: FnOnce(Result<String>),
    {
        done(self.inner.settings.get_audio_parameter(key))
    }

    pub fn set_microphone_mute<F>(&self, muted: bool, done: F)
    where
        F: FnOnce(Result<()>),
    {
        done(self.inner.settings.set_microphone_mute(muted))
    }

    pub fn is_microphone_mute<F>(&self, done: F)
    where
        F: FnOnce(Result<bool>),
    {
        done(self.inner.settings.is_microphone_mute())
    }

    pub fn set_audio_scene<F>(&self, scene: AudioScene, done: F)
    where
        F: FnOnce(Result<()>),
    {
        done(self.inner.settings.set_audio_scene(scene))
    }

    pub fn get_audio_scene<F>(&self, done: F)
    where
        F: FnOnce(Result<AudioScene>),
    {
        done(self.inner.settings.get_audio_scene())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiopolicy_config::PolicyConfig;
    use std::cell::RefCell;

    fn manager() -> AudioManager {
        AudioManager::from_config(&PolicyConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_async_volume() {
        let api = AsyncAudioManager::new(manager());
        api.set_volume(StreamCategory::Media, 5).await.unwrap();
        assert_eq!(api.get_volume(StreamCategory::Media).await.unwrap(), 5);

        let err = api.set_volume(StreamCategory::Media, 28).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_callback_runs_once_with_result() {
        let api = CallbackAudioManager::new(manager());
        let calls = RefCell::new(Vec::new());

        api.set_volume(StreamCategory::Ringtone, 14, |r| {
            calls.borrow_mut().push(r.is_ok())
        });
        api.set_volume(StreamCategory::Ringtone, 28, |r| {
            calls.borrow_mut().push(r.is_ok())
        });
        assert_eq!(*calls.borrow(), vec![true, false]);

        let mut level = None;
        api.get_volume(StreamCategory::Ringtone, |r| level = Some(r.unwrap()));
        assert_eq!(level, Some(14));
    }

    #[tokio::test]
    async fn test_conventions_agree() {
        let shared = manager();
        let promise = AsyncAudioManager::new(shared.handle());
        let callback = CallbackAudioManager::new(shared);

        promise.set_ringer_mode(RingerMode::Silent).await.unwrap();
        let mut mode = None;
        callback.get_ringer_mode(|r| mode = r.ok());
        assert_eq!(mode, Some(RingerMode::Silent));

        let mut missing = None;
        callback.get_audio_parameter("absent", |r| missing = Some(r.is_err()));
        assert_eq!(missing, Some(true));
        assert!(promise.get_audio_parameter("absent").await.is_err());
    }
}
