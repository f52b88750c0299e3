//! HTTP voice-synthesis client
//!
//! Talks to the external voice-synthesis service over JSON. Failure
//! modes map to three distinct kinds so the UI can message each
//! appropriately: transport problems, rejected credentials, and
//! responses without usable audio.

use crate::error::{Error, Result};
use crate::synthesis::{SynthesizedAudio, VoiceSynthesizer};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire default when the service omits the field: 24 kHz mono
const DEFAULT_SAMPLE_RATE: u32 = 24000;
const DEFAULT_CHANNEL_COUNT: u16 = 1;

/// Synthesis request body
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    language: &'a str,
    voice: &'a str,
}

/// Synthesis response body
#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    /// Base64-encoded i16-LE PCM
    audio_data: Option<String>,
    sample_rate: Option<u32>,
    channel_count: Option<u16>,
}

/// HTTP synthesis client
pub struct HttpSynthesizer {
    /// HTTP client with a connect timeout only; the synthesis call has
    /// no overall deadline, cancellation is by supersession
    client: Client,
    endpoint: String,
    api_key: String,
    voice: String,
}

impl HttpSynthesizer {
    /// Create a new HTTP synthesizer.
    ///
    /// # Arguments
    /// - `endpoint`: synthesis service URL
    /// - `api_key`: bearer credential for the service
    /// - `voice`: prebuilt voice name sent with every request
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be built (should not happen
    /// with valid TLS configuration)
    pub fn new(endpoint: String, api_key: String, voice: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint,
            api_key,
            voice,
        }
    }

    /// Validate a response body and unpack the base64 payload.
    fn unpack_response(body: SynthesisResponse) -> Result<SynthesizedAudio> {
        let encoded = match body.audio_data {
            Some(data) if !data.is_empty() => data,
            _ => {
                return Err(Error::EmptyPayload(
                    "synthesis response carried no audio_data field".to_string(),
                ))
            }
        };

        let pcm = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .map_err(|e| Error::EmptyPayload(format!("audio_data is not valid base64: {}", e)))?;

        Ok(SynthesizedAudio {
            pcm,
            sample_rate: body.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            channel_count: body.channel_count.unwrap_or(DEFAULT_CHANNEL_COUNT),
        })
    }
}

#[async_trait]
impl VoiceSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, language: &str) -> Result<SynthesizedAudio> {
        let request = SynthesisRequest {
            text,
            language,
            voice: &self.voice,
        };

        tracing::debug!(
            "Requesting synthesis: language={}, text_len={}",
            language,
            text.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("synthesis request failed: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::Auth(format!(
                    "synthesis service rejected credentials (HTTP {})",
                    response.status().as_u16()
                )));
            }
            status if !status.is_success() => {
                return Err(Error::Network(format!(
                    "synthesis service returned HTTP {}",
                    status.as_u16()
                )));
            }
            _ => {}
        }

        let body: SynthesisResponse = response
            .json()
            .await
            .map_err(|e| Error::EmptyPayload(format!("unreadable synthesis response: {}", e)))?;

        Self::unpack_response(body)
    }
}
