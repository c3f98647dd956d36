//! Event notifier
//!
//! Observer registry keyed by event kind. Dispatch is synchronous: the
//! triggering call invokes every matching listener, in registration order,
//! before it returns. The listener list is snapshotted before invocation, so
//! listeners may call back into the policy, and a listener added while a
//! dispatch is running only sees later events.

use crate::error::PolicyError;
use crate::types::{DeviceChangeAction, RingerMode, VolumeEvent};
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Opaque handle returned by a subscription
pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&PolicyEvent) + Send + Sync>;

/// Subscribable event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    VolumeChange,
    RingerModeChange,
    DeviceChange,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::VolumeChange => "volumeChange",
            EventKind::RingerModeChange => "ringerModeChange",
            EventKind::DeviceChange => "deviceChange",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "volumeChange" => Some(EventKind::VolumeChange),
            "ringerModeChange" => Some(EventKind::RingerModeChange),
            "deviceChange" => Some(EventKind::DeviceChange),
            _ => None,
        }
    }
}

/// A dispatched policy event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum PolicyEvent {
    #[serde(rename = "volumeChange")]
    VolumeChange(VolumeEvent),
    #[serde(rename = "ringerModeChange")]
    RingerModeChange(RingerMode),
    #[serde(rename = "deviceChange")]
    DeviceChange(DeviceChangeAction),
}

impl PolicyEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PolicyEvent::VolumeChange(_) => EventKind::VolumeChange,
            PolicyEvent::RingerModeChange(_) => EventKind::RingerModeChange,
            PolicyEvent::DeviceChange(_) => EventKind::DeviceChange,
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: ListenerId,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
}

/// Shared listener registry
#[derive(Clone, Default)]
pub struct EventNotifier {
    registry: Arc<RwLock<Registry>>,
}

impl fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier").finish_non_exhaustive()
    }
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `kind`
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Result<ListenerId>
    where
        F: Fn(&PolicyEvent) + Send + Sync + 'static,
    {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| PolicyError::StatePoisoned)?;
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        tracing::debug!("Listener {} subscribed to {}", id, kind.name());
        Ok(id)
    }

    /// Remove one listener, or every listener of `kind` when `id` is `None`.
    /// Returns how many were removed.
    pub fn unsubscribe(&self, kind: EventKind, id: Option<ListenerId>) -> Result<usize> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| PolicyError::StatePoisoned)?;
        let Some(listeners) = registry.listeners.get_mut(&kind) else {
            return Ok(0);
        };

        let before = listeners.len();
        match id {
            Some(id) => listeners.retain(|(existing, _)| *existing != id),
            None => listeners.clear(),
        }
        let removed = before - listeners.len();
        tracing::debug!("Removed {} {} listener(s)", removed, kind.name());
        Ok(removed)
    }

    pub fn listener_count(&self, kind: EventKind) -> Result<usize> {
        let registry = self
            .registry
            .read()
            .map_err(|_| PolicyError::StatePoisoned)?;
        Ok(registry.listeners.get(&kind).map_or(0, Vec::len))
    }

    /// Invoke every listener registered for the event's kind.
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &PolicyEvent) -> Result<usize> {
        let snapshot: Vec<Listener> = {
            let registry = self
                .registry
                .read()
                .map_err(|_| PolicyError::StatePoisoned)?;
            registry
                .listeners
                .get(&event.kind())
                .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default()
        };

        for listener in &snapshot {
            listener(event);
        }
        Ok(snapshot.len())
    }
}
