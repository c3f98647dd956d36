//! Stream volume and mute control
//!
//! Levels are validated against the category's range and rejected, never
//! clamped. Mute is a separate flag; it never rewrites the stored level, so
//! unmuting brings back the previous audible level.

use crate::error::PolicyError;
use crate::notifier::{EventNotifier, PolicyEvent};
use crate::store::PolicyStore;
use crate::types::{StreamCategory, VolumeEvent};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDirection {
    Up,
    Down,
}

/// Volume and mute controller
#[derive(Debug, Clone)]
pub struct VolumeController {
    store: PolicyStore,
    notifier: EventNotifier,
}

impl VolumeController {
    pub fn new(store: PolicyStore, notifier: EventNotifier) -> Self {
        Self { store, notifier }
    }

    /// Set a category's volume and dispatch `volumeChange`
    pub fn set_volume(&self, category: StreamCategory, volume: i32) -> Result<()> {
        let event = self.store.write(|state| {
            let stream = state.stream_mut(category)?;
            if !stream.range.contains(volume) {
                return Err(PolicyError::InvalidArgument { category, volume });
            }
            stream.level = volume;
            Ok::<_, PolicyError>(VolumeEvent {
                volume_type: category,
                volume,
                update_ui: false,
            })
        })?;

        let event = match event {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("Rejected volume {} for {}: {}", volume, category, err);
                return Err(err);
            }
        };

        tracing::debug!("{} volume set to {}", category, volume);
        // Dispatch runs after the write lock is released so listeners can
        // re-enter. Concurrent writers to one category may therefore see
        // their events delivered out of store order; the stored level wins.
        self.notifier.dispatch(&PolicyEvent::VolumeChange(event))?;
        Ok(())
    }

    pub fn get_volume(&self, category: StreamCategory) -> Result<i32> {
        self.store.read(|state| state.stream(category).map(|s| s.level))?
    }

    pub fn get_min_volume(&self, category: StreamCategory) -> Result<i32> {
        self.store.read(|state| state.stream(category).map(|s| s.range.min))?
    }

    pub fn get_max_volume(&self, category: StreamCategory) -> Result<i32> {
        self.store.read(|state| state.stream(category).map(|s| s.range.max))?
    }

    /// Step the volume up by one, as a hardware key press would
    pub fn volume_up(&self, category: StreamCategory) -> Result<i32> {
        self.step(category, KeyDirection::Up)
    }

    /// Step the volume down by one, as a hardware key press would
    pub fn volume_down(&self, category: StreamCategory) -> Result<i32> {
        self.step(category, KeyDirection::Down)
    }

    // Key presses saturate at the range bounds and ask for a volume panel.
    fn step(&self, category: StreamCategory, direction: KeyDirection) -> Result<i32> {
        let (level, changed) = self.store.write(|state| {
            let stream = state.stream_mut(category)?;
            let target = match direction {
                KeyDirection::Up => stream.level.saturating_add(1).min(stream.range.max),
                KeyDirection::Down => stream.level.saturating_sub(1).max(stream.range.min),
            };
            let changed = target != stream.level;
            stream.level = target;
            Ok::<_, PolicyError>((target, changed))
        })??;

        if changed {
            tracing::debug!("{} volume stepped to {}", category, level);
            self.notifier.dispatch(&PolicyEvent::VolumeChange(VolumeEvent {
                volume_type: category,
                volume: level,
                update_ui: true,
            }))?;
        }
        Ok(level)
    }

    /// Set the mute flag; the stored level is left as is
    pub fn mute(&self, category: StreamCategory, muted: bool) -> Result<()> {
        self.store.write(|state| {
            state.stream_mut(category).map(|stream| stream.muted = muted)
        })??;
        tracing::debug!("{} muted: {}", category, muted);
        Ok(())
    }

    pub fn is_mute(&self, category: StreamCategory) -> Result<bool> {
        self.store.read(|state| state.stream(category).map(|s| s.muted))?
    }

    /// Whether the category currently has live playback
    pub fn is_active(&self, category: StreamCategory) -> Result<bool> {
        self.store.read(|state| state.stream(category).map(|s| s.active))?
    }

    /// Platform hook: mark playback on a category as started or stopped
    pub fn set_stream_active(&self, category: StreamCategory, active: bool) -> Result<()> {
        self.store.write(|state| {
            state.stream_mut(category).map(|stream| stream.active = active)
        })??;
        tracing::debug!("{} playback active: {}", category, active);
        Ok(())
    }
}
