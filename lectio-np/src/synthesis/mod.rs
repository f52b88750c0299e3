//! Voice synthesis client
//!
//! One narration request yields one encoded payload or one typed
//! failure. Retry policy belongs to the caller; this module never
//! retries and never touches decoder or playback state.

pub mod http;

pub use http::HttpSynthesizer;

use crate::error::Result;
use async_trait::async_trait;

/// Raw audio returned by a synthesis backend.
///
/// The payload is opaque i16-LE PCM until decoded; rate and channel
/// count describe how to interpret it.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Raw PCM bytes (base64 already stripped by the transport)
    pub pcm: Vec<u8>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channel_count: u16,
}

/// Trait for voice-synthesis backends.
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    /// Request narration audio for a text passage. Single attempt.
    async fn synthesize(&self, text: &str, language: &str) -> Result<SynthesizedAudio>;
}
