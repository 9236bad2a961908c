//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_OUTPUT_PATH, DEFAULT_RECORD_SECONDS, MAX_CHUNK_SECS, MAX_GATE_HOLDOVER_FRAMES,
    MAX_RECORD_SECONDS, MIN_CHUNK_SECS, MIN_RECORD_SECONDS,
};

use crate::audio::{
    GateConfig, SessionConfig, DEFAULT_GATE_HOLDOVER_FRAMES, DEFAULT_GATE_THRESHOLD,
};

/// Which pipeline variant to run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// 16 kHz PCM with WAV-wrapped chunks.
    Wav,
    /// 8 kHz μ-law with gated raw chunks.
    Mulaw,
}

/// CLI options for the voxchunk recorder.
#[derive(Debug, Parser, Clone)]
#[command(about = "voxchunk microphone recorder", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Pipeline variant
    #[arg(long, value_enum, default_value = "wav")]
    pub variant: Variant,

    /// Recording duration in seconds
    #[arg(long, default_value_t = DEFAULT_RECORD_SECONDS)]
    pub seconds: u64,

    /// Output WAV path
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Directory for claimed chunks and their manifest; chunks are
    /// discarded when unset
    #[arg(long = "chunk-dir")]
    pub chunk_dir: Option<PathBuf>,

    /// Chunk duration in seconds (defaults per variant)
    #[arg(long = "chunk-secs")]
    pub chunk_secs: Option<u32>,

    /// Disable the voice-activity gate (μ-law variant only)
    #[arg(long = "no-gate", default_value_t = false)]
    pub no_gate: bool,

    /// Gate energy threshold (mean absolute 16-bit amplitude)
    #[arg(long = "gate-threshold", default_value_t = DEFAULT_GATE_THRESHOLD)]
    pub gate_threshold: u16,

    /// Gate holdover, in frames
    #[arg(long = "gate-holdover-frames", default_value_t = DEFAULT_GATE_HOLDOVER_FRAMES)]
    pub gate_holdover_frames: u32,

    /// Enable JSON trace logging
    #[arg(long = "logs", env = "VOXCHUNK_LOGS", default_value_t = false)]
    pub logs: bool,
}

impl AppConfig {
    /// Snapshot the CLI-controlled settings as a session config.
    pub fn session_config(&self) -> SessionConfig {
        let mut config = match self.variant {
            Variant::Wav => SessionConfig::wav_chunks(),
            Variant::Mulaw => SessionConfig::mulaw_chunks(),
        };
        if let Some(chunk_secs) = self.chunk_secs {
            config.chunk_secs = chunk_secs;
        }
        config.gate = GateConfig {
            enabled: config.gate.enabled && !self.no_gate,
            threshold: self.gate_threshold,
            holdover_frames: self.gate_holdover_frames,
            ..config.gate
        };
        config
    }
}
