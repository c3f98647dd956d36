//! Audio focus and interruptions
//!
//! Focus requests form a stack; the last entry holds focus. A new request
//! interrupts the current holder with a hint (pause, duck or stop) chosen
//! from the two stream usages. Abandoning focus hands it back to the next
//! entry with the matching end hint (resume or unduck).

use crate::error::PolicyError;
use crate::notifier::ListenerId;
use crate::types::{AudioInterrupt, InterruptAction, InterruptHint, InterruptType, StreamUsage};
use crate::Result;
use std::fmt;
use std::sync::{Arc, Mutex};

type InterruptCallback = Arc<dyn Fn(&InterruptAction) + Send + Sync>;

/// Where a focus request currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Active,
    Paused,
    Ducked,
}

struct FocusEntry {
    id: ListenerId,
    interrupt: AudioInterrupt,
    state: FocusState,
    callback: InterruptCallback,
}

#[derive(Default)]
struct FocusStack {
    next_id: ListenerId,
    entries: Vec<FocusEntry>,
}

/// Audio focus arbiter
#[derive(Clone, Default)]
pub struct InterruptManager {
    stack: Arc<Mutex<FocusStack>>,
}

impl fmt::Debug for InterruptManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptManager").finish_non_exhaustive()
    }
}

/// Hint delivered to the holder when `incoming` asks for focus
fn begin_hint(incoming: &AudioInterrupt, holder: &AudioInterrupt) -> InterruptHint {
    match (incoming.stream_usage, holder.stream_usage) {
        (StreamUsage::VoiceCommunication, _) => InterruptHint::Pause,
        (StreamUsage::Media, StreamUsage::Media) => InterruptHint::Stop,
        _ if holder.pause_when_ducked => InterruptHint::Pause,
        _ => InterruptHint::Duck,
    }
}

impl InterruptManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request focus. `callback` receives every focus change for this
    /// request, starting with the activation notice.
    pub fn request_focus<F>(&self, interrupt: AudioInterrupt, callback: F) -> Result<ListenerId>
    where
        F: Fn(&InterruptAction) + Send + Sync + 'static,
    {
        let callback: InterruptCallback = Arc::new(callback);
        let mut pending: Vec<(InterruptCallback, InterruptAction)> = Vec::new();

        let id = {
            let mut stack = self.stack.lock().map_err(|_| PolicyError::StatePoisoned)?;

            if let Some(holder) = stack.entries.last_mut() {
                let hint = begin_hint(&interrupt, &holder.interrupt);
                tracing::debug!(
                    "Focus request {} interrupts {} with {}",
                    interrupt.stream_usage,
                    holder.id,
                    hint
                );
                pending.push((
                    Arc::clone(&holder.callback),
                    InterruptAction::interrupt(InterruptType::Begin, hint),
                ));
                holder.state = match hint {
                    InterruptHint::Duck => FocusState::Ducked,
                    _ => FocusState::Paused,
                };
                if hint == InterruptHint::Stop {
                    stack.entries.pop();
                }
            }

            stack.next_id += 1;
            let id = stack.next_id;
            stack.entries.push(FocusEntry {
                id,
                interrupt,
                state: FocusState::Active,
                callback: Arc::clone(&callback),
            });
            id
        };

        pending.push((callback, InterruptAction::activated(true)));
        for (callback, action) in pending {
            callback(&action);
        }
        Ok(id)
    }

    /// Release a focus request. Returns false for an unknown id.
    pub fn abandon_focus(&self, id: ListenerId) -> Result<bool> {
        let handoff = {
            let mut stack = self.stack.lock().map_err(|_| PolicyError::StatePoisoned)?;
            let Some(pos) = stack.entries.iter().position(|e| e.id == id) else {
                return Ok(false);
            };
            let was_holder = pos + 1 == stack.entries.len();
            stack.entries.remove(pos);

            match stack.entries.last_mut() {
                Some(next) if was_holder => {
                    let hint = match next.state {
                        FocusState::Ducked => InterruptHint::Unduck,
                        FocusState::Paused => InterruptHint::Resume,
                        FocusState::Active => InterruptHint::None,
                    };
                    next.state = FocusState::Active;
                    Some((
                        Arc::clone(&next.callback),
                        InterruptAction::interrupt(InterruptType::End, hint),
                    ))
                }
                _ => None,
            }
        };

        tracing::debug!("Focus request {} abandoned", id);
        if let Some((callback, action)) = handoff {
            callback(&action);
        }
        Ok(true)
    }

    /// Id and parameters of the current focus holder
    pub fn focus_holder(&self) -> Result<Option<(ListenerId, AudioInterrupt)>> {
        let stack = self.stack.lock().map_err(|_| PolicyError::StatePoisoned)?;
        Ok(stack.entries.last().map(|e| (e.id, e.interrupt)))
    }

    /// State of a request, or `None` once it has been stopped or abandoned
    pub fn focus_state(&self, id: ListenerId) -> Result<Option<FocusState>> {
        let stack = self.stack.lock().map_err(|_| PolicyError::StatePoisoned)?;
        Ok(stack.entries.iter().find(|e| e.id == id).map(|e| e.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentType, InterruptActionType};

    fn media() -> AudioInterrupt {
        AudioInterrupt::new(StreamUsage::Media, ContentType::Music)
    }

    fn call() -> AudioInterrupt {
        AudioInterrupt::new(StreamUsage::VoiceCommunication, ContentType::Speech)
    }

    fn ringtone() -> AudioInterrupt {
        AudioInterrupt::new(StreamUsage::NotificationRingtone, ContentType::Ringtone)
    }

    fn recorder() -> (
        Arc<Mutex<Vec<InterruptAction>>>,
        impl Fn(&InterruptAction) + Send + Sync + 'static,
    ) {
        let actions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&actions);
        (actions, move |action: &InterruptAction| {
            sink.lock().unwrap().push(*action)
        })
    }

    #[test]
    fn test_first_request_is_activated() {
        let manager = InterruptManager::new();
        let (actions, callback) = recorder();
        let id = manager.request_focus(media(), callback).unwrap();

        let actions = actions.lock().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, InterruptActionType::Activated);
        assert_eq!(actions[0].activated, Some(true));
        assert_eq!(manager.focus_holder().unwrap().map(|(i, _)| i), Some(id));
    }

    #[test]
    fn test_call_pauses_media_then_resumes() {
        let manager = InterruptManager::new();
        let (music_actions, music_cb) = recorder();
        let music = manager.request_focus(media(), music_cb).unwrap();
        let call_id = manager.request_focus(call(), |_| {}).unwrap();

        assert_eq!(manager.focus_state(music).unwrap(), Some(FocusState::Paused));
        {
            let actions = music_actions.lock().unwrap();
            assert_eq!(actions[1].interrupt_type, Some(InterruptType::Begin));
            assert_eq!(actions[1].hint, Some(InterruptHint::Pause));
        }

        assert!(manager.abandon_focus(call_id).unwrap());
        assert_eq!(manager.focus_state(music).unwrap(), Some(FocusState::Active));
        let actions = music_actions.lock().unwrap();
        assert_eq!(actions[2].interrupt_type, Some(InterruptType::End));
        assert_eq!(actions[2].hint, Some(InterruptHint::Resume));
    }

    #[test]
    fn test_ringtone_ducks_media() {
        let manager = InterruptManager::new();
        let (music_actions, music_cb) = recorder();
        let music = manager.request_focus(media(), music_cb).unwrap();
        let ring = manager.request_focus(ringtone(), |_| {}).unwrap();

        assert_eq!(manager.focus_state(music).unwrap(), Some(FocusState::Ducked));
        manager.abandon_focus(ring).unwrap();

        let actions = music_actions.lock().unwrap();
        assert_eq!(actions[1].hint, Some(InterruptHint::Duck));
        assert_eq!(actions[2].hint, Some(InterruptHint::Unduck));
    }

    #[test]
    fn test_pause_when_ducked() {
        let manager = InterruptManager::new();
        let music = manager
            .request_focus(media().pause_when_ducked(true), |_| {})
            .unwrap();
        manager.request_focus(ringtone(), |_| {}).unwrap();
        assert_eq!(manager.focus_state(music).unwrap(), Some(FocusState::Paused));
    }

    #[test]
    fn test_media_stops_media() {
        let manager = InterruptManager::new();
        let (first_actions, first_cb) = recorder();
        let first = manager.request_focus(media(), first_cb).unwrap();
        let second = manager.request_focus(media(), |_| {}).unwrap();

        assert_eq!(manager.focus_state(first).unwrap(), None);
        assert_eq!(first_actions.lock().unwrap()[1].hint, Some(InterruptHint::Stop));

        // nothing left to hand focus back to
        manager.abandon_focus(second).unwrap();
        assert_eq!(manager.focus_holder().unwrap(), None);
        assert_eq!(first_actions.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_abandon_non_holder_is_silent() {
        let manager = InterruptManager::new();
        let (music_actions, music_cb) = recorder();
        let music = manager.request_focus(media(), music_cb).unwrap();
        let (call_actions, call_cb) = recorder();
        let call_id = manager.request_focus(call(), call_cb).unwrap();

        assert!(manager.abandon_focus(music).unwrap());
        assert_eq!(music_actions.lock().unwrap().len(), 2);
        assert_eq!(call_actions.lock().unwrap().len(), 1);
        assert_eq!(manager.focus_holder().unwrap().map(|(i, _)| i), Some(call_id));
    }

    #[test]
    fn test_abandon_unknown_id() {
        let manager = InterruptManager::new();
        assert!(!manager.abandon_focus(42).unwrap());
    }
}
