//! Policy enumerations and event payloads
//!
//! Every enumeration is canonical in its named form; the raw integer is only
//! its wire representation and maps back bijectively through `TryFrom<i32>`.

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! raw_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $raw:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        #[repr(i32)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $raw ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Underlying integer representation
            pub fn as_raw(self) -> i32 {
                self as i32
            }

            /// snake_case name used in configuration and commands
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Parse from a snake_case name, ignoring case
            pub fn from_name(name: &str) -> Option<Self> {
                match name.trim().to_lowercase().as_str() {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl TryFrom<i32> for $name {
            type Error = PolicyError;

            fn try_from(raw: i32) -> Result<Self, Self::Error> {
                match raw {
                    $($raw => Ok($name::$variant),)+
                    _ => Err(PolicyError::UnknownValue { kind: $kind, raw }),
                }
            }
        }

        impl FromStr for $name {
            type Err = PolicyError;

            /// Accepts either the name or the raw integer
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<i32>() {
                    Ok(raw) => Self::try_from(raw),
                    Err(_) => Self::from_name(s).ok_or_else(|| PolicyError::UnknownName {
                        kind: $kind,
                        name: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

raw_enum! {
    /// Independent volume/mute axis
    pub enum StreamCategory ("stream category") {
        VoiceCall = 0 => "voice_call",
        Ringtone = 2 => "ringtone",
        Media = 3 => "media",
        VoiceAssistant = 9 => "voice_assistant",
    }
}

raw_enum! {
    /// Role filter for device queries
    pub enum DeviceFlag ("device flag") {
        Output = 1 => "output",
        Input = 2 => "input",
        All = 3 => "all",
    }
}

raw_enum! {
    pub enum DeviceRole ("device role") {
        Input = 1 => "input",
        Output = 2 => "output",
    }
}

raw_enum! {
    /// Concrete hardware or transport kind of an endpoint
    pub enum DeviceType ("device type") {
        Invalid = 0 => "invalid",
        Earpiece = 1 => "earpiece",
        Speaker = 2 => "speaker",
        WiredHeadset = 3 => "wired_headset",
        WiredHeadphones = 4 => "wired_headphones",
        BluetoothSco = 7 => "bluetooth_sco",
        BluetoothA2dp = 8 => "bluetooth_a2dp",
        Mic = 15 => "mic",
        UsbHeadset = 22 => "usb_headset",
    }
}

raw_enum! {
    /// Output devices that can be switched on and off explicitly
    pub enum ActiveDeviceType ("active device type") {
        Speaker = 2 => "speaker",
        BluetoothSco = 7 => "bluetooth_sco",
    }
}

raw_enum! {
    pub enum RingerMode ("ringer mode") {
        Silent = 0 => "silent",
        Vibrate = 1 => "vibrate",
        Normal = 2 => "normal",
    }
}

raw_enum! {
    pub enum AudioScene ("audio scene") {
        Default = 0 => "default",
        Ringing = 1 => "ringing",
        PhoneCall = 2 => "phone_call",
        VoiceChat = 3 => "voice_chat",
    }
}

raw_enum! {
    pub enum InterruptType ("interrupt type") {
        Begin = 1 => "begin",
        End = 2 => "end",
    }
}

raw_enum! {
    /// What the interrupted holder is expected to do
    pub enum InterruptHint ("interrupt hint") {
        None = 0 => "none",
        Resume = 1 => "resume",
        Pause = 2 => "pause",
        Stop = 3 => "stop",
        Duck = 4 => "duck",
        Unduck = 5 => "unduck",
    }
}

raw_enum! {
    pub enum InterruptForceType ("interrupt force type") {
        Force = 0 => "force",
        Share = 1 => "share",
    }
}

raw_enum! {
    pub enum InterruptActionType ("interrupt action type") {
        Activated = 0 => "activated",
        Interrupt = 1 => "interrupt",
    }
}

raw_enum! {
    pub enum DeviceChangeType ("device change type") {
        Connect = 0 => "connect",
        Disconnect = 1 => "disconnect",
    }
}

raw_enum! {
    pub enum StreamUsage ("stream usage") {
        Unknown = 0 => "unknown",
        Media = 1 => "media",
        VoiceCommunication = 2 => "voice_communication",
        NotificationRingtone = 6 => "notification_ringtone",
    }
}

raw_enum! {
    pub enum ContentType ("content type") {
        Unknown = 0 => "unknown",
        Speech = 1 => "speech",
        Music = 2 => "music",
        Movie = 3 => "movie",
        Sonification = 4 => "sonification",
        Ringtone = 5 => "ringtone",
    }
}

impl DeviceFlag {
    /// Whether a device with this role passes the filter
    pub fn matches(self, role: DeviceRole) -> bool {
        match self {
            DeviceFlag::All => true,
            DeviceFlag::Output => role == DeviceRole::Output,
            DeviceFlag::Input => role == DeviceRole::Input,
        }
    }
}

impl ActiveDeviceType {
    pub fn device_type(self) -> DeviceType {
        match self {
            ActiveDeviceType::Speaker => DeviceType::Speaker,
            ActiveDeviceType::BluetoothSco => DeviceType::BluetoothSco,
        }
    }

    pub fn from_device_type(device_type: DeviceType) -> Option<Self> {
        match device_type {
            DeviceType::Speaker => Some(ActiveDeviceType::Speaker),
            DeviceType::BluetoothSco => Some(ActiveDeviceType::BluetoothSco),
            _ => None,
        }
    }
}

/// A routable audio endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub role: DeviceRole,
    pub device_type: DeviceType,
}

impl DeviceDescriptor {
    pub fn new(role: DeviceRole, device_type: DeviceType) -> Self {
        Self { role, device_type }
    }

    pub fn output(device_type: DeviceType) -> Self {
        Self::new(DeviceRole::Output, device_type)
    }

    pub fn input(device_type: DeviceType) -> Self {
        Self::new(DeviceRole::Input, device_type)
    }
}

/// Closed volume range for one stream category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRange {
    pub min: i32,
    pub max: i32,
}

impl VolumeRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, level: i32) -> bool {
        (self.min..=self.max).contains(&level)
    }
}

/// Payload of `volumeChange`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeEvent {
    pub volume_type: StreamCategory,
    pub volume: i32,
    /// Set for key-driven changes that should show a volume panel
    pub update_ui: bool,
}

/// Payload of `deviceChange`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceChangeAction {
    pub change_type: DeviceChangeType,
    pub device_descriptors: Vec<DeviceDescriptor>,
}

/// Focus request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInterrupt {
    pub stream_usage: StreamUsage,
    pub content_type: ContentType,
    /// Prefer being paused over being ducked
    pub pause_when_ducked: bool,
}

impl AudioInterrupt {
    pub fn new(stream_usage: StreamUsage, content_type: ContentType) -> Self {
        Self {
            stream_usage,
            content_type,
            pause_when_ducked: false,
        }
    }

    pub fn pause_when_ducked(mut self, pause: bool) -> Self {
        self.pause_when_ducked = pause;
        self
    }
}

/// Focus notification delivered to a focus requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptAction {
    pub action_type: InterruptActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_type: Option<InterruptType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<InterruptHint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_type: Option<InterruptForceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated: Option<bool>,
}

impl InterruptAction {
    pub fn activated(granted: bool) -> Self {
        Self {
            action_type: InterruptActionType::Activated,
            interrupt_type: None,
            hint: None,
            force_type: None,
            activated: Some(granted),
        }
    }

    pub fn interrupt(interrupt_type: InterruptType, hint: InterruptHint) -> Self {
        let force_type = match hint {
            InterruptHint::Duck | InterruptHint::Unduck => InterruptForceType::Share,
            _ => InterruptForceType::Force,
        };
        Self {
            action_type: InterruptActionType::Interrupt,
            interrupt_type: Some(interrupt_type),
            hint: Some(hint),
            force_type: Some(force_type),
            activated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_category_raw_values() {
        assert_eq!(StreamCategory::VoiceCall.as_raw(), 0);
        assert_eq!(StreamCategory::Ringtone.as_raw(), 2);
        assert_eq!(StreamCategory::Media.as_raw(), 3);
        assert_eq!(StreamCategory::VoiceAssistant.as_raw(), 9);
    }

    #[test]
    fn test_raw_values_are_bijective() {
        for category in StreamCategory::ALL {
            assert_eq!(StreamCategory::try_from(category.as_raw()).unwrap(), *category);
        }
        for device in DeviceType::ALL {
            assert_eq!(DeviceType::try_from(device.as_raw()).unwrap(), *device);
        }
        for hint in InterruptHint::ALL {
            assert_eq!(InterruptHint::try_from(hint.as_raw()).unwrap(), *hint);
        }
    }

    #[test]
    fn test_unknown_raw_value() {
        let err = RingerMode::try_from(5).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::UnknownValue {
                kind: "ringer mode",
                raw: 5
            }
        ));
        assert!(StreamCategory::try_from(1).is_err());
    }

    #[test]
    fn test_pinned_constants() {
        assert_eq!(DeviceFlag::Output.as_raw(), 1);
        assert_eq!(DeviceFlag::Input.as_raw(), 2);
        assert_eq!(DeviceFlag::All.as_raw(), 3);
        assert_eq!(ActiveDeviceType::Speaker.as_raw(), 2);
        assert_eq!(ActiveDeviceType::BluetoothSco.as_raw(), 7);
        assert_eq!(RingerMode::Silent.as_raw(), 0);
        assert_eq!(RingerMode::Vibrate.as_raw(), 1);
        assert_eq!(RingerMode::Normal.as_raw(), 2);
        assert_eq!(InterruptType::Begin.as_raw(), 1);
        assert_eq!(InterruptType::End.as_raw(), 2);
        assert_eq!(InterruptHint::Unduck.as_raw(), 5);
        assert_eq!(InterruptForceType::Share.as_raw(), 1);
    }

    #[test]
    fn test_parse_name_or_raw() {
        assert_eq!("media".parse::<StreamCategory>().unwrap(), StreamCategory::Media);
        assert_eq!("MEDIA".parse::<StreamCategory>().unwrap(), StreamCategory::Media);
        assert_eq!("3".parse::<StreamCategory>().unwrap(), StreamCategory::Media);
        assert_eq!(
            "bluetooth_sco".parse::<ActiveDeviceType>().unwrap(),
            ActiveDeviceType::BluetoothSco
        );
        assert!("loud".parse::<RingerMode>().is_err());
    }

    #[test]
    fn test_device_flag_filter() {
        assert!(DeviceFlag::All.matches(DeviceRole::Input));
        assert!(DeviceFlag::All.matches(DeviceRole::Output));
        assert!(DeviceFlag::Output.matches(DeviceRole::Output));
        assert!(!DeviceFlag::Output.matches(DeviceRole::Input));
        assert!(!DeviceFlag::Input.matches(DeviceRole::Output));
    }

    #[test]
    fn test_volume_range() {
        let range = VolumeRange::new(0, 15);
        assert!(range.contains(0));
        assert!(range.contains(15));
        assert!(!range.contains(-1));
        assert!(!range.contains(28));
    }

    #[test]
    fn test_interrupt_force_type() {
        let duck = InterruptAction::interrupt(InterruptType::Begin, InterruptHint::Duck);
        assert_eq!(duck.force_type, Some(InterruptForceType::Share));

        let pause = InterruptAction::interrupt(InterruptType::Begin, InterruptHint::Pause);
        assert_eq!(pause.force_type, Some(InterruptForceType::Force));
        assert_eq!(pause.action_type, InterruptActionType::Interrupt);
    }

    #[test]
    fn test_volume_event_json() {
        let event = VolumeEvent {
            volume_type: StreamCategory::Media,
            volume: 5,
            update_ui: false,
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["volume_type"], "media");
        assert_eq!(json["volume"], 5);
        assert_eq!(json["update_ui"], false);
    }
}
