//! Audio policy core
//!
//! Process-wide audio policy: per-stream volume and mute, output device
//! routing, ringer mode, opaque audio parameters, microphone mute, audio
//! scene and audio focus. All state lives in one shared store; every
//! [`AudioManager`] handle observes it, and changes are announced to
//! subscribed listeners before the triggering call returns.
//!
//! # Example
//!
//! ```no_run
//! use audiopolicy_config::PolicyConfig;
//! use audiopolicy_core::{AsyncAudioManager, AudioManager, StreamCategory};
//!
//! async fn run() -> audiopolicy_core::Result<()> {
//!     let manager = AudioManager::from_config(&PolicyConfig::load_default()?)?;
//!     manager.on_volume_change(|event| {
//!         println!("{} -> {}", event.volume_type, event.volume);
//!     })?;
//!
//!     let api = AsyncAudioManager::new(manager);
//!     api.set_volume(StreamCategory::Media, 10).await?;
//!     assert_eq!(api.get_volume(StreamCategory::Media).await?, 10);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod error;
pub mod interrupt;
pub mod manager;
pub mod mock;
pub mod notifier;
pub mod routing;
pub mod settings;
pub mod store;
pub mod types;
pub mod volume;

pub use api::{AsyncAudioManager, CallbackAudioManager};
pub use error::{PolicyError, VOLUME_ERROR_MESSAGE};
pub use interrupt::{FocusState, InterruptManager};
pub use manager::AudioManager;
pub use notifier::{EventKind, EventNotifier, ListenerId, PolicyEvent};
pub use routing::DeviceRouter;
pub use settings::SettingsController;
pub use store::{PolicyState, PolicyStore};
pub use types::{
    ActiveDeviceType, AudioInterrupt, AudioScene, ContentType, DeviceChangeAction,
    DeviceChangeType, DeviceDescriptor, DeviceFlag, DeviceRole, DeviceType, InterruptAction,
    InterruptActionType, InterruptForceType, InterruptHint, InterruptType, RingerMode,
    StreamCategory, StreamUsage, VolumeEvent, VolumeRange,
};
pub use volume::VolumeController;

/// Policy Result type
pub type Result<T> = std::result::Result<T, PolicyError>;
