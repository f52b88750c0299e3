//! Narration engine
//!
//! Orchestrates the pipeline: synthesis request, PCM decode, playback
//! session. The engine is the only component mutated by user actions
//! and drives the four-state machine Idle → Requesting → Decoding →
//! Playing.
//!
//! Cancellation contract: a new narration always wins over whatever is
//! in flight. Each `narrate` call takes a fresh attempt number; the
//! results of superseded attempts (synthesis outcome, decoded buffer,
//! playback completion) are discarded without touching state, so a
//! slow, replaced operation can never resurrect stale state.

use crate::audio::decode_pcm;
use crate::error::{Error, Result};
use crate::playback::{NarrationSink, SessionController, SessionId};
use crate::state::{CurrentNarration, SharedState};
use crate::synthesis::VoiceSynthesizer;
use lectio_common::events::{NarrationEvent, NarrationState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Narration engine - the single owner of the pipeline.
///
/// The session controller's mutex doubles as the lifecycle lock: every
/// state transition happens while holding it, which with the attempt
/// counter gives the stale-result suppression the pipeline relies on.
pub struct NarrationEngine {
    /// Shared state visible to the API layer
    state: Arc<SharedState>,

    /// Voice-synthesis backend
    synthesizer: Arc<dyn VoiceSynthesizer>,

    /// Playback session controller (also the lifecycle lock)
    controller: Mutex<SessionController>,

    /// Process-wide attempt counter; the live attempt is the last
    /// value. Bumped only while holding the controller lock.
    attempt: AtomicU64,

    /// Language tag used when a request does not carry one
    default_language: String,

    /// Natural-completion signals from the sink, taken by `start`
    completion_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<SessionId>>>,
}

impl NarrationEngine {
    /// Create a new narration engine.
    ///
    /// # Arguments
    /// - `state`: shared state written by the engine, read by the API
    /// - `synthesizer`: voice-synthesis backend
    /// - `sink`: audio backend; must report natural completions on the
    ///   sending half of `completion_rx`
    /// - `completion_rx`: receiving half of the sink's completion channel
    /// - `default_language`: fallback language tag
    pub fn new(
        state: Arc<SharedState>,
        synthesizer: Arc<dyn VoiceSynthesizer>,
        sink: Box<dyn NarrationSink>,
        completion_rx: mpsc::UnboundedReceiver<SessionId>,
        default_language: String,
    ) -> Self {
        Self {
            state,
            synthesizer,
            controller: Mutex::new(SessionController::new(sink)),
            attempt: AtomicU64::new(0),
            default_language,
            completion_rx: std::sync::Mutex::new(Some(completion_rx)),
        }
    }

    /// Start the engine's background completion loop.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let mut rx = self
            .completion_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::Internal("engine already started".to_string()))?;

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(session_id) = rx.recv().await {
                engine.on_session_complete(session_id).await;
            }
            debug!("Completion channel closed");
        });

        info!("Narration engine started");
        Ok(())
    }

    /// Request narration of a text passage. Fire-and-manage: returns
    /// the request id immediately, the pipeline runs in the background.
    ///
    /// Invoked in any non-Idle state this is the cancellation path:
    /// any live session is stopped synchronously before the fresh
    /// Idle → Requesting transition, and in-flight results of the
    /// previous attempt are discarded when they eventually land.
    pub async fn narrate(self: &Arc<Self>, text: String, language: Option<String>) -> Uuid {
        let request_id = Uuid::new_v4();

        info!(
            "Narration requested: request_id={}, text_len={}",
            request_id,
            text.len()
        );

        // The attempt number is allocated under the lock so counter
        // order equals lock order: a concurrent narrate that locked
        // later holds a higher number, and the writes below can never
        // be run by anything but the newest attempt.
        let attempt;
        {
            let mut controller = self.controller.lock().await;
            attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
            self.finish_replaced(&mut controller).await;

            self.state
                .set_current(Some(CurrentNarration {
                    request_id,
                    session_id: None,
                }))
                .await;
            self.state
                .set_narration_state(NarrationState::Requesting)
                .await;
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.run_attempt(attempt, request_id, text, language).await;
        });

        request_id
    }

    /// Stop the current narration. No-op when idle.
    ///
    /// Cancels the whole attempt, not just an audible session: results
    /// of in-flight synthesis or decode for it are ignored.
    pub async fn stop_narration(&self) {
        let mut controller = self.controller.lock().await;
        self.attempt.fetch_add(1, Ordering::SeqCst);
        self.finish_replaced(&mut controller).await;

        self.state.set_current(None).await;
        self.state.set_narration_state(NarrationState::Idle).await;
    }

    /// Run one narration attempt end to end.
    async fn run_attempt(
        &self,
        attempt: u64,
        request_id: Uuid,
        text: String,
        language: Option<String>,
    ) {
        let language = language.unwrap_or_else(|| self.default_language.clone());

        let audio = match self.synthesizer.synthesize(&text, &language).await {
            Ok(audio) => audio,
            Err(e) => return self.fail_attempt(attempt, request_id, e).await,
        };

        if !self.advance_if_live(attempt, NarrationState::Decoding).await {
            debug!("Discarding synthesis result of superseded attempt {}", attempt);
            return;
        }

        debug!(
            "Decoding payload: {} bytes, {}Hz, {} channel(s)",
            audio.pcm.len(),
            audio.sample_rate,
            audio.channel_count
        );

        // CPU-bound; keep it off the async schedule
        let decoded = tokio::task::spawn_blocking(move || {
            decode_pcm(&audio.pcm, audio.sample_rate, audio.channel_count)
        })
        .await;

        let buffer = match decoded {
            Ok(Ok(buffer)) => Arc::new(buffer),
            Ok(Err(e)) => return self.fail_attempt(attempt, request_id, e).await,
            Err(e) => {
                let e = Error::Internal(format!("decode task failed: {}", e));
                return self.fail_attempt(attempt, request_id, e).await;
            }
        };

        let mut controller = self.controller.lock().await;
        if self.is_superseded(attempt) {
            debug!("Discarding decoded buffer of superseded attempt {}", attempt);
            return;
        }

        match controller.start(Arc::clone(&buffer)) {
            Ok(session_id) => {
                drop(controller);

                self.state
                    .set_current(Some(CurrentNarration {
                        request_id,
                        session_id: Some(session_id),
                    }))
                    .await;
                self.state.set_narration_state(NarrationState::Playing).await;
                self.state.broadcast_event(NarrationEvent::NarrationStarted {
                    request_id,
                    session_id,
                    duration_ms: buffer.duration_ms(),
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(e) => {
                drop(controller);
                self.fail_attempt(attempt, request_id, e).await;
            }
        }
    }

    /// Handle a natural-completion signal from the sink.
    async fn on_session_complete(&self, session_id: SessionId) {
        let mut controller = self.controller.lock().await;
        if !controller.acknowledge_completion(session_id) {
            // Stale signal from a stopped or replaced session
            return;
        }
        drop(controller);

        let request_id = self.state.current().await.map(|c| c.request_id);
        self.state.set_current(None).await;

        if let Some(request_id) = request_id {
            self.state.broadcast_event(NarrationEvent::NarrationFinished {
                request_id,
                completed: true,
                timestamp: chrono::Utc::now(),
            });
        }
        self.state.set_narration_state(NarrationState::Idle).await;
    }

    /// Fold a failed attempt back to Idle and surface the error once.
    ///
    /// Failures of superseded attempts are discarded entirely.
    async fn fail_attempt(&self, attempt: u64, request_id: Uuid, e: Error) {
        let mut controller = self.controller.lock().await;
        if self.is_superseded(attempt) {
            debug!("Discarding failure of superseded attempt {}: {}", attempt, e);
            return;
        }
        // No session may outlive the attempt
        controller.stop();
        drop(controller);

        error!("Narration attempt failed ({}): {}", e.kind(), e);

        self.state.set_current(None).await;
        self.state.broadcast_event(NarrationEvent::NarrationFailed {
            request_id,
            kind: e.kind().to_string(),
            message: e.to_string(),
            timestamp: chrono::Utc::now(),
        });
        self.state.set_narration_state(NarrationState::Idle).await;
    }

    /// Advance the state machine if `attempt` is still the live one.
    async fn advance_if_live(&self, attempt: u64, state: NarrationState) -> bool {
        let _controller = self.controller.lock().await;
        if self.is_superseded(attempt) {
            return false;
        }
        self.state.set_narration_state(state).await;
        true
    }

    /// Stop a live session, announcing it as finished-without-completing.
    ///
    /// Attempts that never reached Playing produce no finish event.
    async fn finish_replaced(&self, controller: &mut SessionController) {
        if controller.active_session().is_none() {
            return;
        }
        controller.stop();

        if let Some(current) = self.state.current().await {
            self.state.broadcast_event(NarrationEvent::NarrationFinished {
                request_id: current.request_id,
                completed: false,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn is_superseded(&self, attempt: u64) -> bool {
        self.attempt.load(Ordering::SeqCst) != attempt
    }
}
