//! Device inventory configuration
//!
//! Lists the audio endpoints the policy knows about at startup.

use serde::{Deserialize, Serialize};

/// One routable audio endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// `input` or `output`
    pub role: String,
    /// Device kind (speaker, earpiece, wired_headset, bluetooth_sco, mic, ...)
    pub kind: String,
    /// Whether the endpoint is currently plugged in or paired
    #[serde(default = "default_true")]
    pub connected: bool,
    /// Whether the endpoint is the active route for its kind
    #[serde(default)]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl DeviceEntry {
    pub fn new(role: &str, kind: &str) -> Self {
        Self {
            role: role.to_string(),
            kind: kind.to_string(),
            connected: true,
            active: false,
        }
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }
}

/// Built-in device inventory for a handset-class device
pub fn default_devices() -> Vec<DeviceEntry> {
    vec![
        DeviceEntry::new("output", "speaker").active(),
        DeviceEntry::new("output", "earpiece"),
        DeviceEntry::new("output", "bluetooth_sco"),
        DeviceEntry::new("output", "wired_headset").disconnected(),
        DeviceEntry::new("input", "mic"),
    ]
}
