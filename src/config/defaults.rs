//! Default values and limits for CLI options.

pub const DEFAULT_RECORD_SECONDS: u64 = 10;
pub const MIN_RECORD_SECONDS: u64 = 1;
pub const MAX_RECORD_SECONDS: u64 = 3_600;

pub const DEFAULT_OUTPUT_PATH: &str = "recording.wav";

pub const MIN_CHUNK_SECS: u32 = 1;
pub const MAX_CHUNK_SECS: u32 = 600;

pub const MAX_GATE_HOLDOVER_FRAMES: u32 = 1_000;
