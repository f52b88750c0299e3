//! Playback session control and audio sinks

pub mod session;
pub mod sink;

pub use session::{SessionController, SessionId};
pub use sink::{CpalSink, NarrationSink};
