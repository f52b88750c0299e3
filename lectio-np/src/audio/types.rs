//! Core audio data types
//!
//! Defines the decoded narration buffer and per-frame sample types used
//! throughout the narration pipeline.

/// NarrationBuffer holds a fully decoded narration ready for playback.
///
/// **Format:**
/// - Samples are f32, normalized to approximately [-1.0, 1.0)
/// - Planar layout: one Vec per channel, each exactly `frame_count` long
/// - Immutable once built (constructed only by the PCM decoder)
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationBuffer {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count (>= 1)
    pub channel_count: u16,

    /// Per-channel sample arrays
    pub channels: Vec<Vec<f32>>,

    /// Number of frames (one sample per channel per frame)
    pub frame_count: usize,
}

impl NarrationBuffer {
    /// Get duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        (self.frame_count as u64 * 1000) / self.sample_rate as u64
    }
}

/// A single stereo sample (one frame of audio).
///
/// Mono narration is duplicated to both channels at this boundary; the
/// output device consumes frames in this form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame {
            left: 0.0,
            right: 0.0,
        }
    }

    /// Clamp samples to [-1.0, 1.0] to prevent clipping
    pub fn clamp(&mut self) {
        self.left = self.left.clamp(-1.0, 1.0);
        self.right = self.right.clamp(-1.0, 1.0);
    }
}
