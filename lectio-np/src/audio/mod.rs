//! Audio pipeline: PCM decoding, resampling, and device output

pub mod decode;
pub mod output;
pub mod resampler;
pub mod types;

pub use decode::decode_pcm;
pub use types::{AudioFrame, NarrationBuffer};
