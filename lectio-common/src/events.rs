//! Event types for the Lectio event system

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Narration pipeline state.
///
/// All states except `Idle` belong to exactly one in-flight narration
/// attempt; the attempt's request id travels alongside in `SharedState`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NarrationState {
    /// No narration in flight or audible
    Idle,
    /// Waiting on the voice-synthesis service
    Requesting,
    /// Decoding the returned PCM payload
    Decoding,
    /// A playback session is audible
    Playing,
}

impl std::fmt::Display for NarrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NarrationState::Idle => write!(f, "idle"),
            NarrationState::Requesting => write!(f, "requesting"),
            NarrationState::Decoding => write!(f, "decoding"),
            NarrationState::Playing => write!(f, "playing"),
        }
    }
}

/// Lectio event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NarrationEvent {
    /// Narration pipeline state changed
    NarrationStateChanged {
        state: NarrationState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A playback session became audible
    NarrationStarted {
        request_id: Uuid,
        session_id: u64,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Narration finished.
    ///
    /// `completed` is true for natural end of the buffer, false when the
    /// session was stopped or replaced.
    NarrationFinished {
        request_id: Uuid,
        completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Narration attempt failed
    NarrationFailed {
        request_id: Uuid,
        /// Stable error kind string (see `lectio-np` Error::kind)
        kind: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl NarrationEvent {
    /// Get event type as string for SSE event field / filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            NarrationEvent::NarrationStateChanged { .. } => "NarrationStateChanged",
            NarrationEvent::NarrationStarted { .. } => "NarrationStarted",
            NarrationEvent::NarrationFinished { .. } => "NarrationFinished",
            NarrationEvent::NarrationFailed { .. } => "NarrationFailed",
        }
    }
}
