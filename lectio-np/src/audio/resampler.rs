//! Audio resampling using rubato
//!
//! Narration buffers arrive at the synthesis service's rate (typically
//! 24 kHz) and are converted once, in full, to the output device's rate
//! before a playback session starts.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, Resampler as RubatoResampler};
use tracing::debug;

/// Resample planar audio to the device sample rate.
///
/// # Arguments
/// - `channels`: planar samples, one Vec per channel, equal lengths
/// - `input_rate`: source sample rate
/// - `output_rate`: device sample rate
///
/// # Returns
/// Planar samples at `output_rate`. When the rates already match, the
/// input is returned unchanged.
pub fn resample_planar(
    channels: Vec<Vec<f32>>,
    input_rate: u32,
    output_rate: u32,
) -> Result<Vec<Vec<f32>>> {
    if input_rate == output_rate {
        debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(channels);
    }

    let input_frames = channels.first().map(|c| c.len()).unwrap_or(0);
    if input_frames == 0 {
        return Ok(channels);
    }

    debug!(
        "Resampling from {}Hz to {}Hz ({} channels, {} frames)",
        input_rate,
        output_rate,
        channels.len(),
        input_frames
    );

    // FastFixedIn gives a good quality/performance tradeoff; the whole
    // buffer is processed as a single chunk since narration is decoded
    // in full before playback.
    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0, // no runtime ratio changes
        rubato::PolynomialDegree::Septic,
        input_frames,
        channels.len(),
    )
    .map_err(|e| Error::PlaybackDevice(format!("Failed to create resampler: {}", e)))?;

    let output = resampler
        .process(&channels, None)
        .map_err(|e| Error::PlaybackDevice(format!("Resampling failed: {}", e)))?;

    debug!(
        "Resampled {} input frames to {} output frames",
        input_frames,
        output.first().map(|c| c.len()).unwrap_or(0)
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let channels = vec![vec![0.1, 0.2, 0.3]];
        let output = resample_planar(channels.clone(), 48000, 48000).unwrap();
        assert_eq!(output, channels);
    }

    #[test]
    fn test_empty_input() {
        let output = resample_planar(vec![vec![]], 24000, 48000).unwrap();
        assert!(output[0].is_empty());
    }

    #[test]
    fn test_upsample_ratio() {
        // 440Hz sine, one second at 24kHz
        let input_rate = 24000;
        let output_rate = 48000;
        let frames = 24000;

        let sine: Vec<f32> = (0..frames)
            .map(|i| {
                let t = i as f32 / input_rate as f32;
                (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
            })
            .collect();

        let output = resample_planar(vec![sine], input_rate, output_rate).unwrap();
        let output_frames = output[0].len();

        let expected = frames * output_rate as usize / input_rate as usize;
        assert!(
            output_frames.abs_diff(expected) <= 20,
            "Expected ~{} frames, got {}",
            expected,
            output_frames
        );
    }
}
