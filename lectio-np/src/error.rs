//! Error types for lectio-np
//!
//! Defines service-specific error types using thiserror for clear error
//! propagation. Every pipeline failure is terminal for the current
//! narration attempt; the engine folds back to Idle and surfaces the
//! error once.

use thiserror::Error;

/// Main error type for the narration player
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure talking to the synthesis service
    #[error("Synthesis network error: {0}")]
    Network(String),

    /// Synthesis service rejected the credentials
    #[error("Synthesis authorization error: {0}")]
    Auth(String),

    /// Synthesis response carried no usable audio payload
    #[error("Empty synthesis payload: {0}")]
    EmptyPayload(String),

    /// PCM payload length does not align to whole frames
    #[error(
        "PCM payload misaligned: {byte_length} bytes is not a multiple of {frame_bytes} \
         (2 bytes x {channel_count} channels)"
    )]
    DecodeAlignment {
        byte_length: usize,
        channel_count: u16,
        frame_bytes: usize,
    },

    /// Decoder input constraints violated (zero channels or sample rate)
    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    /// Audio output device failure
    #[error("Playback device error: {0}")]
    PlaybackDevice(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable error kind string carried by NarrationFailed events and
    /// API error bodies, for user-facing messaging.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network",
            Error::Auth(_) => "auth",
            Error::EmptyPayload(_) => "empty_payload",
            Error::DecodeAlignment { .. } => "decode_alignment",
            Error::InvalidFormat(_) => "invalid_format",
            Error::PlaybackDevice(_) => "playback_device",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<lectio_common::Error> for Error {
    fn from(e: lectio_common::Error) -> Self {
        match e {
            lectio_common::Error::Io(io) => Error::Io(io),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using lectio-np Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(Error::Network("x".into()).kind(), "network");
        assert_eq!(Error::Auth("x".into()).kind(), "auth");
        assert_eq!(Error::EmptyPayload("x".into()).kind(), "empty_payload");
        assert_eq!(
            Error::DecodeAlignment {
                byte_length: 3,
                channel_count: 1,
                frame_bytes: 2
            }
            .kind(),
            "decode_alignment"
        );
        assert_eq!(Error::PlaybackDevice("x".into()).kind(), "playback_device");
    }

    #[test]
    fn test_alignment_error_message() {
        let err = Error::DecodeAlignment {
            byte_length: 5,
            channel_count: 2,
            frame_bytes: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("5 bytes"));
        assert!(msg.contains("2 channels"));
    }
}
