//! Device routing
//!
//! Tracks which endpoints are connected and which switchable outputs are
//! active. Activation is independent per device unless the policy enables
//! exclusive mode, where activating one switchable output turns the others
//! off.

use crate::error::PolicyError;
use crate::notifier::{EventNotifier, PolicyEvent};
use crate::store::{DeviceState, PolicyStore};
use crate::types::{
    ActiveDeviceType, DeviceChangeAction, DeviceChangeType, DeviceDescriptor, DeviceFlag,
};
use crate::Result;

/// Device routing controller
#[derive(Debug, Clone)]
pub struct DeviceRouter {
    store: PolicyStore,
    notifier: EventNotifier,
}

impl DeviceRouter {
    pub fn new(store: PolicyStore, notifier: EventNotifier) -> Self {
        Self { store, notifier }
    }

    /// Connected devices whose role passes `flag`
    pub fn get_devices(&self, flag: DeviceFlag) -> Result<Vec<DeviceDescriptor>> {
        self.store.read(|state| {
            state
                .devices
                .iter()
                .filter(|d| d.connected && flag.matches(d.descriptor.role))
                .map(|d| d.descriptor)
                .collect()
        })
    }

    pub fn set_device_active(&self, device: ActiveDeviceType, active: bool) -> Result<()> {
        let descriptor = DeviceDescriptor::output(device.device_type());

        self.store.write(|state| {
            let exclusive = state.exclusive_active_devices;
            let target = state
                .device_mut(descriptor)
                .filter(|d| d.connected)
                .ok_or(PolicyError::DeviceUnavailable(device))?;
            target.active = active;

            if active && exclusive {
                for other in state.devices.iter_mut().filter(|d| is_switchable_peer(d, descriptor)) {
                    if other.active {
                        tracing::debug!("Deactivating {} (exclusive routing)", other.descriptor.device_type);
                        other.active = false;
                    }
                }
            }
            Ok::<_, PolicyError>(())
        })??;

        tracing::info!("Device {} active: {}", device, active);
        Ok(())
    }

    pub fn is_device_active(&self, device: ActiveDeviceType) -> Result<bool> {
        let descriptor = DeviceDescriptor::output(device.device_type());
        self.store
            .read(|state| state.device(descriptor).is_some_and(|d| d.connected && d.active))
    }

    /// Mark a device as connected and dispatch `deviceChange`.
    /// Returns false when it was already connected.
    pub fn connect_device(&self, descriptor: DeviceDescriptor) -> Result<bool> {
        let changed = self.store.write(|state| match state.device_mut(descriptor) {
            Some(existing) if existing.connected => false,
            Some(existing) => {
                existing.connected = true;
                true
            }
            None => {
                state.devices.push(DeviceState {
                    descriptor,
                    connected: true,
                    active: false,
                });
                true
            }
        })?;

        if changed {
            tracing::info!("Device connected: {} {}", descriptor.role, descriptor.device_type);
            self.dispatch_change(DeviceChangeType::Connect, descriptor)?;
        }
        Ok(changed)
    }

    /// Mark a device as disconnected, clear its active flag and dispatch
    /// `deviceChange`. Returns false when it was not connected.
    pub fn disconnect_device(&self, descriptor: DeviceDescriptor) -> Result<bool> {
        let changed = self.store.write(|state| match state.device_mut(descriptor) {
            Some(existing) if existing.connected => {
                existing.connected = false;
                existing.active = false;
                true
            }
            _ => false,
        })?;

        if changed {
            tracing::info!("Device disconnected: {} {}", descriptor.role, descriptor.device_type);
            self.dispatch_change(DeviceChangeType::Disconnect, descriptor)?;
        }
        Ok(changed)
    }

    fn dispatch_change(&self, change_type: DeviceChangeType, descriptor: DeviceDescriptor) -> Result<()> {
        self.notifier.dispatch(&PolicyEvent::DeviceChange(DeviceChangeAction {
            change_type,
            device_descriptors: vec![descriptor],
        }))?;
        Ok(())
    }
}

fn is_switchable_peer(device: &DeviceState, activated: DeviceDescriptor) -> bool {
    device.descriptor != activated
        && device.descriptor.role == activated.role
        && ActiveDeviceType::from_device_type(device.descriptor.device_type).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::EventKind;
    use crate::types::{DeviceRole, DeviceType};
    use audiopolicy_config::{DeviceEntry, PolicyConfig};
    use std::sync::{Arc, Mutex};

    fn router_with(config: &PolicyConfig) -> DeviceRouter {
        let store = PolicyStore::from_config(config).unwrap();
        DeviceRouter::new(store, EventNotifier::new())
    }

    fn router() -> DeviceRouter {
        router_with(&PolicyConfig::default())
    }

    #[test]
    fn test_get_devices_by_flag() {
        let router = router();

        let outputs = router.get_devices(DeviceFlag::Output).unwrap();
        assert!(!outputs.is_empty());
        assert!(outputs.iter().all(|d| d.role == DeviceRole::Output));
        // wired headset is configured but not plugged in
        assert!(!outputs.iter().any(|d| d.device_type == DeviceType::WiredHeadset));

        let inputs = router.get_devices(DeviceFlag::Input).unwrap();
        assert_eq!(inputs, vec![DeviceDescriptor::input(DeviceType::Mic)]);

        let all = router.get_devices(DeviceFlag::All).unwrap();
        assert_eq!(all.len(), outputs.len() + inputs.len());
        assert!(all.iter().all(|d| d.device_type != DeviceType::Invalid));
    }

    #[test]
    fn test_activation_round_trip() {
        let router = router();
        for device in [ActiveDeviceType::Speaker, ActiveDeviceType::BluetoothSco] {
            router.set_device_active(device, true).unwrap();
            assert!(router.is_device_active(device).unwrap());
            router.set_device_active(device, false).unwrap();
            assert!(!router.is_device_active(device).unwrap());
        }
    }

    #[test]
    fn test_activation_not_exclusive_by_default() {
        let router = router();
        router.set_device_active(ActiveDeviceType::Speaker, true).unwrap();
        router.set_device_active(ActiveDeviceType::BluetoothSco, true).unwrap();
        assert!(router.is_device_active(ActiveDeviceType::Speaker).unwrap());
        assert!(router.is_device_active(ActiveDeviceType::BluetoothSco).unwrap());
    }

    #[test]
    fn test_exclusive_activation() {
        let mut config = PolicyConfig::default();
        config.policy.exclusive_active_devices = true;
        let router = router_with(&config);

        router.set_device_active(ActiveDeviceType::Speaker, true).unwrap();
        router.set_device_active(ActiveDeviceType::BluetoothSco, true).unwrap();
        assert!(!router.is_device_active(ActiveDeviceType::Speaker).unwrap());
        assert!(router.is_device_active(ActiveDeviceType::BluetoothSco).unwrap());

        // deactivating does not touch peers
        router.set_device_active(ActiveDeviceType::BluetoothSco, false).unwrap();
        assert!(!router.is_device_active(ActiveDeviceType::Speaker).unwrap());
    }

    #[test]
    fn test_activate_unavailable_device() {
        let mut config = PolicyConfig::default();
        config.devices = vec![DeviceEntry::new("output", "speaker")];
        let router = router_with(&config);

        let err = router
            .set_device_active(ActiveDeviceType::BluetoothSco, true)
            .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::DeviceUnavailable(ActiveDeviceType::BluetoothSco)
        ));
        assert!(!router.is_device_active(ActiveDeviceType::BluetoothSco).unwrap());
    }

    #[test]
    fn test_connect_and_disconnect_dispatch() {
        let router = router();
        let actions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&actions);
        router
            .notifier
            .subscribe(EventKind::DeviceChange, move |event| {
                if let PolicyEvent::DeviceChange(action) = event {
                    sink.lock().unwrap().push(action.clone());
                }
            })
            .unwrap();

        let headset = DeviceDescriptor::output(DeviceType::WiredHeadset);
        assert!(router.connect_device(headset).unwrap());
        assert!(!router.connect_device(headset).unwrap());
        assert!(router.get_devices(DeviceFlag::Output).unwrap().contains(&headset));

        assert!(router.disconnect_device(headset).unwrap());
        assert!(!router.disconnect_device(headset).unwrap());

        let actions = actions.lock().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].change_type, DeviceChangeType::Connect);
        assert_eq!(actions[0].device_descriptors, vec![headset]);
        assert_eq!(actions[1].change_type, DeviceChangeType::Disconnect);
    }

    #[test]
    fn test_connect_new_device_and_disconnect_clears_active() {
        let router = router();
        let usb = DeviceDescriptor::output(DeviceType::UsbHeadset);
        assert!(router.connect_device(usb).unwrap());
        assert!(router.get_devices(DeviceFlag::All).unwrap().contains(&usb));

        router.set_device_active(ActiveDeviceType::BluetoothSco, true).unwrap();
        let sco = DeviceDescriptor::output(DeviceType::BluetoothSco);
        router.disconnect_device(sco).unwrap();
        assert!(!router.is_device_active(ActiveDeviceType::BluetoothSco).unwrap());
        assert!(router.set_device_active(ActiveDeviceType::BluetoothSco, true).is_err());
    }
}
