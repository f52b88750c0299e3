//! Audio output using cpal
//!
//! Manages the audio device and the playback stream. The device is the
//! single shared output resource of the narration subsystem; only the
//! playback sink touches it.

use crate::audio::AudioFrame;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Audio output manager using cpal.
///
/// Holds the device and at most one active stream. `cpal::Stream` is
/// not Send, so this type must live on the thread that created it.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
}

impl AudioOutput {
    /// Open an audio device for output.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    ///
    /// If the requested device is not found, falls back to the default
    /// device rather than failing.
    ///
    /// # Errors
    /// - No usable output device
    /// - Failed to get a device configuration
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            let mut devices = host.output_devices().map_err(|e| {
                Error::PlaybackDevice(format!("Failed to enumerate devices: {}", e))
            })?;

            match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                Some(dev) => {
                    info!("Found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!(
                        "Requested device '{}' not found, falling back to default device",
                        name
                    );
                    host.default_output_device().ok_or_else(|| {
                        Error::PlaybackDevice(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::PlaybackDevice("No default output device found".to_string()))?
        };

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let (config, sample_format) = Self::get_best_config(&device)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
        })
    }

    /// Get the best supported configuration for playback.
    ///
    /// Prefers stereo f32; otherwise falls back to the device default.
    fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported_configs = device
            .supported_output_configs()
            .map_err(|e| Error::PlaybackDevice(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported_configs
            .find(|config| config.channels() == 2 && config.sample_format() == SampleFormat::F32);

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            let config = supported_config.with_max_sample_rate().config();
            return Ok((config, sample_format));
        }

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::PlaybackDevice(format!("Failed to get default config: {}", e)))?;

        let sample_format = supported_config.sample_format();
        Ok((supported_config.config(), sample_format))
    }

    /// Start the audio stream with a frame callback.
    ///
    /// The callback runs on the real-time audio thread; it must not
    /// block and should return `AudioFrame::zero()` when no audio is
    /// available.
    pub fn start<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut() -> AudioFrame + Send + 'static,
    {
        info!("Starting audio stream");

        let callback = Arc::new(Mutex::new(callback));

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(callback)?,
            SampleFormat::I16 => self.build_stream::<i16>(callback)?,
            SampleFormat::U16 => self.build_stream::<u16>(callback)?,
            sample_format => {
                return Err(Error::PlaybackDevice(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::PlaybackDevice(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);

        info!("Audio stream started");
        Ok(())
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        callback: Arc<Mutex<dyn FnMut() -> AudioFrame + Send + 'static>>,
    ) -> Result<Stream> {
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut callback = callback.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let mut audio_frame = callback();
                        audio_frame.clamp();

                        frame[0] = T::from_sample(audio_frame.left);
                        if channels > 1 {
                            frame[1] = T::from_sample(audio_frame.right);
                        }
                        // Channels past stereo stay silent
                        for sample in frame.iter_mut().skip(2) {
                            *sample = T::from_sample(0.0f32);
                        }
                    }
                },
                move |err| {
                    warn!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::PlaybackDevice(format!("Failed to build stream: {}", e)))?;

        Ok(stream)
    }

    /// Stop the audio stream, dropping the stream reference.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::PlaybackDevice(format!("Failed to pause stream: {}", e)))?;
            drop(stream);
        }

        Ok(())
    }

    /// Get the device sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Get the device channel count.
    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
