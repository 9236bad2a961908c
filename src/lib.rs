pub mod audio;
pub mod config;
pub mod telemetry;

pub use audio::{
    encode_mulaw, encode_wav, BlockStatus, ChunkEncoding, ChunkPayload, EncodedChunk, EnergyGate,
    GateConfig, LiveMeter, PendingChunk, RateConverter, Recorder, Session, SessionConfig,
    SessionError,
};
