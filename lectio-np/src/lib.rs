//! # Lectio Narration Player (lectio-np)
//!
//! Text-to-speech narration microservice for Lectio.
//!
//! **Purpose:** Send text passages to a voice-synthesis service, decode
//! the returned PCM payload, and play it through the system audio
//! device, with an HTTP/SSE control interface.
//!
//! **Architecture:** Single-pipeline engine using reqwest + cpal + rubato

pub mod api;
pub mod audio;
pub mod engine;
pub mod error;
pub mod playback;
pub mod state;
pub mod synthesis;

pub use error::{Error, Result};
pub use state::SharedState;
