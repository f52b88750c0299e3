//! Playback session control
//!
//! Owns the single audio output resource through the `NarrationSink`
//! seam and enforces the one-active-session invariant. Session ids are
//! unique and strictly increasing for the process lifetime; completion
//! signals are matched by id, never by object identity.

use crate::audio::NarrationBuffer;
use crate::error::Result;
use crate::playback::sink::NarrationSink;
use std::sync::Arc;
use tracing::{debug, warn};

/// Monotonically increasing playback session identifier
pub type SessionId = u64;

/// Controls playback sessions over a narration sink.
///
/// At most one session is active at any instant. `start` always stops
/// the prior session synchronously before the new one is bound to the
/// sink (stop-before-start ordering).
pub struct SessionController {
    sink: Box<dyn NarrationSink>,
    next_id: SessionId,
    active: Option<SessionId>,
}

impl SessionController {
    /// Create a controller over the given sink.
    pub fn new(sink: Box<dyn NarrationSink>) -> Self {
        Self {
            sink,
            next_id: 1,
            active: None,
        }
    }

    /// Start a new playback session for `buffer`.
    ///
    /// Any active session is stopped first. On success the new session
    /// id is active and the sink will report it on natural completion.
    pub fn start(&mut self, buffer: Arc<NarrationBuffer>) -> Result<SessionId> {
        self.stop();

        let id = self.next_id;
        self.next_id += 1;

        self.sink.play(buffer, id)?;
        self.active = Some(id);

        debug!("Playback session {} started", id);
        Ok(id)
    }

    /// Stop the active session. No-op when nothing is active.
    ///
    /// Invalidates the active id, so a natural-completion signal for it
    /// arriving later is discarded as stale.
    pub fn stop(&mut self) {
        if let Some(id) = self.active.take() {
            debug!("Stopping playback session {}", id);
            self.sink.stop();
        }
    }

    /// Acknowledge a natural-completion signal from the sink.
    ///
    /// Returns true when the signal matches the active session, which
    /// then transitions to inactive. Signals for superseded sessions
    /// are discarded.
    pub fn acknowledge_completion(&mut self, session_id: SessionId) -> bool {
        if self.active == Some(session_id) {
            debug!("Playback session {} completed", session_id);
            self.active = None;
            true
        } else {
            warn!("Discarding stale completion for session {}", session_id);
            false
        }
    }

    /// The currently active session, if any.
    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }
}
