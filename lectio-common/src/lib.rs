//! # Lectio Common Library
//!
//! Shared code for Lectio services including:
//! - Event types (NarrationEvent enum)
//! - Narration state enum
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{NarrationEvent, NarrationState};
