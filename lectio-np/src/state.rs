//! Shared narration state
//!
//! Thread-safe state for coordination between the narration engine and
//! the API layer. The engine is the only writer; the API reads state
//! and subscribes to the event stream.

use crate::playback::SessionId;
use lectio_common::events::{NarrationEvent, NarrationState};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// The narration attempt the pipeline is currently working on
#[derive(Debug, Clone)]
pub struct CurrentNarration {
    /// Request id handed back to the caller
    pub request_id: Uuid,
    /// Playback session, once one exists
    pub session_id: Option<SessionId>,
}

/// Shared state accessible by engine and API handlers
pub struct SharedState {
    /// Current pipeline state
    narration_state: RwLock<NarrationState>,

    /// Current narration attempt (None when Idle)
    current: RwLock<Option<CurrentNarration>>,

    /// Event broadcaster for SSE listeners
    event_tx: broadcast::Sender<NarrationEvent>,
}

impl SharedState {
    /// Create new shared state, Idle with no listeners
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            narration_state: RwLock::new(NarrationState::Idle),
            current: RwLock::new(None),
            event_tx,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: NarrationEvent) {
        // No receivers is OK
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<NarrationEvent> {
        self.event_tx.subscribe()
    }

    /// Get current narration state
    pub async fn narration_state(&self) -> NarrationState {
        *self.narration_state.read().await
    }

    /// Set narration state and broadcast the change.
    ///
    /// No event is emitted when the state does not actually change.
    pub async fn set_narration_state(&self, state: NarrationState) {
        let mut guard = self.narration_state.write().await;
        if *guard == state {
            return;
        }
        *guard = state;
        drop(guard);

        self.broadcast_event(NarrationEvent::NarrationStateChanged {
            state,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Get the current narration attempt
    pub async fn current(&self) -> Option<CurrentNarration> {
        self.current.read().await.clone()
    }

    /// Set the current narration attempt
    pub async fn set_current(&self, current: Option<CurrentNarration>) {
        *self.current.write().await = current;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let state = SharedState::new();
        assert_eq!(state.narration_state().await, NarrationState::Idle);
        assert!(state.current().await.is_none());
    }

    #[tokio::test]
    async fn test_state_change_broadcasts() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        state.set_narration_state(NarrationState::Requesting).await;
        assert_eq!(state.narration_state().await, NarrationState::Requesting);

        match rx.recv().await.unwrap() {
            NarrationEvent::NarrationStateChanged { state, .. } => {
                assert_eq!(state, NarrationState::Requesting);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_event_for_same_state() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        state.set_narration_state(NarrationState::Idle).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_current_narration() {
        let state = SharedState::new();

        let current = CurrentNarration {
            request_id: Uuid::new_v4(),
            session_id: Some(3),
        };
        state.set_current(Some(current.clone())).await;

        let retrieved = state.current().await.unwrap();
        assert_eq!(retrieved.request_id, current.request_id);
        assert_eq!(retrieved.session_id, Some(3));
    }
}
