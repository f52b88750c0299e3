//! Raw PCM decoder
//!
//! Decodes the synthesis service's payload format: signed 16-bit
//! little-endian PCM with channels interleaved round-robin. Pure and
//! deterministic; identical input yields bit-identical output.

use crate::audio::types::NarrationBuffer;
use crate::error::{Error, Result};

/// Normalization divisor mapping i16 samples to [-1.0, 1.0)
const PCM_SCALE: f32 = 32768.0;

/// Decode an i16-LE PCM payload into a normalized narration buffer.
///
/// Samples are distributed round-robin across channels: sample 0 goes to
/// channel 0, sample 1 to channel 1, ..., sample N to channel
/// N mod `channel_count`. Each integer is normalized by dividing by
/// 32768.0.
///
/// # Arguments
/// - `payload`: raw bytes, length must be a multiple of `2 * channel_count`
/// - `sample_rate`: sample rate in Hz, must be > 0
/// - `channel_count`: number of channels, must be >= 1
///
/// # Errors
/// - `Error::InvalidFormat` when `sample_rate` or `channel_count` is zero
/// - `Error::DecodeAlignment` when the payload does not divide into
///   whole frames; no partial buffer is returned
pub fn decode_pcm(payload: &[u8], sample_rate: u32, channel_count: u16) -> Result<NarrationBuffer> {
    if channel_count == 0 {
        return Err(Error::InvalidFormat(
            "channel count must be at least 1".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(Error::InvalidFormat(
            "sample rate must be greater than 0".to_string(),
        ));
    }

    let frame_bytes = 2 * channel_count as usize;
    if payload.len() % frame_bytes != 0 {
        return Err(Error::DecodeAlignment {
            byte_length: payload.len(),
            channel_count,
            frame_bytes,
        });
    }

    let frame_count = payload.len() / frame_bytes;
    let num_channels = channel_count as usize;
    let mut channels = vec![Vec::with_capacity(frame_count); num_channels];

    for (sample_index, bytes) in payload.chunks_exact(2).enumerate() {
        let value = i16::from_le_bytes([bytes[0], bytes[1]]);
        channels[sample_index % num_channels].push(value as f32 / PCM_SCALE);
    }

    Ok(NarrationBuffer {
        sample_rate,
        channel_count,
        channels,
        frame_count,
    })
}
