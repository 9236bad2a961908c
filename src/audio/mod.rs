//! Streaming microphone capture pipeline.
//!
//! Native-rate samples are downsampled with a fractional accumulator,
//! optionally gated and μ-law compressed, and buffered into fixed-duration
//! chunks that can be claimed one at a time while recording continues.
//! Every stage runs synchronously inside the capture callback; control
//! operations talk to the same state from the caller's thread.

/// Sample rate delivered by the capture hardware on the reference device.
/// The capture driver overrides this with the actual device rate.
pub const NATIVE_RATE: u32 = 44_100;

/// Output rate for the plain WAV-chunk pipeline.
pub const WAV_OUTPUT_RATE: u32 = 16_000;

/// Output rate for the μ-law chunk pipeline.
pub const MULAW_OUTPUT_RATE: u32 = 8_000;

mod dispatch;
mod downsample;
mod meter;
mod mulaw;
mod recorder;
mod segment;
mod session;
mod vad;
mod wav;

pub use downsample::RateConverter;
pub use meter::LiveMeter;
pub use mulaw::encode_mulaw;
pub use recorder::Recorder;
pub use segment::{ChunkPayload, PendingChunk};
pub use session::{BlockStatus, ChunkEncoding, EncodedChunk, Session, SessionConfig, SessionError};
pub use vad::{
    EnergyGate, GateConfig, DEFAULT_GATE_FRAME_SAMPLES, DEFAULT_GATE_HOLDOVER_FRAMES,
    DEFAULT_GATE_THRESHOLD,
};
pub use wav::encode_wav;
