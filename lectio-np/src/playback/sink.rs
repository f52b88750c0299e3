//! Narration sinks
//!
//! `NarrationSink` is the seam between the session controller and the
//! audio device. `CpalSink` is the production implementation: the
//! `cpal::Stream` is not Send, so the device lives on a dedicated audio
//! thread created on first use, and the stream callback pulls frames
//! from a shared source slot.

use crate::audio::output::AudioOutput;
use crate::audio::resampler::resample_planar;
use crate::audio::{AudioFrame, NarrationBuffer};
use crate::error::{Error, Result};
use crate::playback::session::SessionId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::info;

/// Audio backend seam for the session controller.
///
/// `play` binds the sink to a buffer for one session; when the buffer
/// is exhausted without an intervening `stop`, the sink reports the
/// session id on the completion channel it was constructed with.
pub trait NarrationSink: Send {
    /// Begin output of `buffer`, replacing any current source.
    fn play(&mut self, buffer: Arc<NarrationBuffer>, session_id: SessionId) -> Result<()>;

    /// Halt output immediately. No-op when nothing is playing.
    fn stop(&mut self);
}

/// The source currently feeding the stream callback
struct ActiveSource {
    /// Device-rate stereo frames
    frames: Vec<AudioFrame>,
    cursor: usize,
    session_id: SessionId,
}

/// cpal-backed narration sink.
///
/// The audio device is opened lazily on the first `play`. One
/// persistent output stream runs from then on; starting and stopping a
/// session only swaps the source slot the callback reads from, so
/// stop-before-start never glitches the device.
pub struct CpalSink {
    device_name: Option<String>,
    completion_tx: mpsc::UnboundedSender<SessionId>,
    slot: Arc<Mutex<Option<ActiveSource>>>,
    /// Device sample rate, known once the audio thread is up
    device_rate: Option<u32>,
    shutdown: Arc<AtomicBool>,
}

impl CpalSink {
    /// Create a sink reporting natural completions on `completion_tx`.
    ///
    /// The device is not touched until the first `play`.
    pub fn new(device_name: Option<String>, completion_tx: mpsc::UnboundedSender<SessionId>) -> Self {
        Self {
            device_name,
            completion_tx,
            slot: Arc::new(Mutex::new(None)),
            device_rate: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bring up the audio thread ahead of the first session.
    ///
    /// `play` does this lazily as a fallback, but bring-up waits on the
    /// device for up to five seconds; calling this at startup keeps
    /// that wait off the request path.
    pub fn initialize(&mut self) -> Result<()> {
        self.ensure_started().map(|_| ())
    }

    /// Spawn the audio thread on first use and learn the device rate.
    fn ensure_started(&mut self) -> Result<u32> {
        if let Some(rate) = self.device_rate {
            return Ok(rate);
        }

        let device_name = self.device_name.clone();
        let slot = Arc::clone(&self.slot);
        let completion_tx = self.completion_tx.clone();
        let shutdown = Arc::clone(&self.shutdown);

        // The audio thread reports its device rate (or startup failure)
        // back over a one-shot std channel, then keeps the stream alive.
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<u32>>();

        std::thread::spawn(move || {
            let mut output = match AudioOutput::new(device_name.as_deref()) {
                Ok(output) => output,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let callback = move || {
                let mut guard = slot.lock().unwrap();
                match guard.as_mut() {
                    Some(source) if source.cursor < source.frames.len() => {
                        let frame = source.frames[source.cursor];
                        source.cursor += 1;
                        frame
                    }
                    Some(source) => {
                        // Buffer exhausted: report natural completion
                        // once and release the slot.
                        let session_id = source.session_id;
                        *guard = None;
                        let _ = completion_tx.send(session_id);
                        AudioFrame::zero()
                    }
                    None => AudioFrame::zero(),
                }
            };

            let rate = output.sample_rate();
            if let Err(e) = output.start(callback) {
                let _ = ready_tx.send(Err(e));
                return;
            }

            let _ = ready_tx.send(Ok(rate));
            info!("Audio thread running at {}Hz", rate);

            // Keep the stream alive; it stops when this thread exits
            // and the AudioOutput is dropped.
            while !shutdown.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(200));
            }

            info!("Audio thread stopping");
        });

        // Device bring-up can take seconds; when called from a runtime
        // worker (the lazy play path), yield the worker while waiting.
        let ready = match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| {
                    ready_rx.recv_timeout(std::time::Duration::from_secs(5))
                })
            }
            _ => ready_rx.recv_timeout(std::time::Duration::from_secs(5)),
        };
        let rate = ready
            .map_err(|_| Error::PlaybackDevice("audio thread did not start".to_string()))??;

        self.device_rate = Some(rate);
        Ok(rate)
    }

    /// Convert a narration buffer to device-rate stereo frames.
    fn prepare_frames(buffer: &NarrationBuffer, device_rate: u32) -> Result<Vec<AudioFrame>> {
        let channels = resample_planar(buffer.channels.clone(), buffer.sample_rate, device_rate)?;

        let frame_count = channels.first().map(|c| c.len()).unwrap_or(0);
        let mut frames = Vec::with_capacity(frame_count);

        for i in 0..frame_count {
            let left = channels[0][i];
            // Mono duplicates to both channels; channels past stereo
            // are dropped (no mixing in scope).
            let right = if channels.len() > 1 { channels[1][i] } else { left };
            frames.push(AudioFrame { left, right });
        }

        Ok(frames)
    }
}

impl NarrationSink for CpalSink {
    fn play(&mut self, buffer: Arc<NarrationBuffer>, session_id: SessionId) -> Result<()> {
        let device_rate = self.ensure_started()?;
        let frames = Self::prepare_frames(&buffer, device_rate)?;

        *self.slot.lock().unwrap() = Some(ActiveSource {
            frames,
            cursor: 0,
            session_id,
        });

        Ok(())
    }

    fn stop(&mut self) {
        *self.slot.lock().unwrap() = None;
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
