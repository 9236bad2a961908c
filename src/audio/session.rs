//! Recording session state machine.
//!
//! A session owns every mutable piece of an active recording: the tracks,
//! the rate converter, the gate, the level, and the pending-chunk slot. It
//! is constructed when recording starts and consumed when it stops, so two
//! sessions never share state and tests can run as many as they like side
//! by side. The capture driver feeds it blocks of native-rate samples;
//! control calls inspect or consume its outputs.

use std::collections::TryReserveError;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::downsample::RateConverter;
use super::meter::block_rms;
use super::mulaw::encode_mulaw;
use super::segment::{ChunkPayload, SegmentBuffer};
use super::vad::{EnergyGate, GateConfig};
use super::wav::encode_wav;
use super::{MULAW_OUTPUT_RATE, NATIVE_RATE, WAV_OUTPUT_RATE};

/// Errors surfaced to the control layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("already recording")]
    AlreadyRecording,
    #[error("not recording")]
    NotRecording,
    #[error("no audio recorded")]
    NoAudio,
    #[error("audio buffer allocation failed")]
    OutOfMemory,
    #[error("invalid session config: {0}")]
    Config(String),
}

/// Outcome of feeding one block to the pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    /// Keep feeding.
    Continue,
    /// Buffer growth failed; the session no longer accepts samples, but
    /// everything captured so far remains retrievable.
    Halted,
}

/// How a claimed chunk's bytes are encoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkEncoding {
    PcmWav,
    Mulaw,
}

/// A claimed chunk, ready for upload or storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    pub bytes: Vec<u8>,
    pub sequence: u64,
    pub encoding: ChunkEncoding,
}

/// Pipeline parameters. The two stock presets cover the plain WAV-chunk
/// recorder and the gated μ-law recorder; everything in between is fair
/// game as long as the rates downsample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub native_rate: u32,
    pub output_rate: u32,
    pub chunk_secs: u32,
    pub buffer_secs: u32,
    pub compression: bool,
    pub gate: GateConfig,
}

impl SessionConfig {
    /// Plain 16 kHz recording with five-minute WAV chunks.
    pub fn wav_chunks() -> Self {
        Self {
            native_rate: NATIVE_RATE,
            output_rate: WAV_OUTPUT_RATE,
            chunk_secs: 300,
            buffer_secs: 30,
            compression: false,
            gate: GateConfig {
                enabled: false,
                ..GateConfig::default()
            },
        }
    }

    /// 8 kHz μ-law recording with gated thirty-second chunks and the raw
    /// PCM retained as a backup track.
    pub fn mulaw_chunks() -> Self {
        Self {
            native_rate: NATIVE_RATE,
            output_rate: MULAW_OUTPUT_RATE,
            chunk_secs: 30,
            buffer_secs: 30,
            compression: true,
            gate: GateConfig::default(),
        }
    }

    pub fn chunk_samples(&self) -> usize {
        self.output_rate as usize * self.chunk_secs as usize
    }

    fn buffer_samples(&self) -> usize {
        self.output_rate as usize * self.buffer_secs as usize
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.output_rate == 0 || self.native_rate <= self.output_rate {
            return Err(SessionError::Config(format!(
                "native rate {} must exceed output rate {}",
                self.native_rate, self.output_rate
            )));
        }
        if self.chunk_secs == 0 {
            return Err(SessionError::Config("chunk duration must be nonzero".into()));
        }
        if self.buffer_secs == 0 {
            return Err(SessionError::Config(
                "buffer duration must be nonzero".into(),
            ));
        }
        if self.gate.frame_samples == 0 {
            return Err(SessionError::Config("gate frame must be nonzero".into()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::wav_chunks()
    }
}

/// One active recording.
pub struct Session {
    config: SessionConfig,
    converter: RateConverter,
    gate: EnergyGate,
    segments: SegmentBuffer,
    level: f32,
    halted: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let segments = SegmentBuffer::new(
            config.buffer_samples(),
            config.buffer_samples(),
            config.chunk_samples(),
            config.compression,
        )
        .map_err(|_| SessionError::OutOfMemory)?;
        info!(
            native_rate = config.native_rate,
            output_rate = config.output_rate,
            chunk_samples = config.chunk_samples(),
            compression = config.compression,
            gate = config.gate.enabled,
            "recording session started"
        );
        Ok(Self {
            converter: RateConverter::new(config.native_rate, config.output_rate),
            gate: EnergyGate::new(&config.gate),
            segments,
            level: 0.0,
            config,
            halted: false,
        })
    }

    /// Feed one native-rate block. Runs the whole pipeline synchronously:
    /// level metering, downsampling, gating, compression, and chunk
    /// bookkeeping. An empty block changes nothing.
    pub fn process_block(&mut self, block: &[i16]) -> BlockStatus {
        if self.halted {
            return BlockStatus::Halted;
        }
        if block.is_empty() {
            return BlockStatus::Continue;
        }
        self.level = block_rms(block);
        for &sample in block {
            let Some(output) = self.converter.push(sample) else {
                continue;
            };
            if self.commit_output(output).is_err() {
                warn!(
                    raw_samples = self.segments.raw_len(),
                    "buffer growth failed; halting capture"
                );
                self.halted = true;
                return BlockStatus::Halted;
            }
        }
        BlockStatus::Continue
    }

    fn commit_output(&mut self, sample: i16) -> Result<(), TryReserveError> {
        self.segments.append_raw(sample)?;
        if self.config.compression {
            if !self.gate.is_enabled() {
                self.segments.push_compressed(encode_mulaw(sample))?;
            } else if let Some(frame) = self.gate.push(sample) {
                if frame.pass {
                    for &passed in frame.samples {
                        self.segments.push_compressed(encode_mulaw(passed))?;
                    }
                }
            }
        }
        self.segments.roll_boundary();
        Ok(())
    }

    /// Normalized RMS of the most recent native-rate block; 0 before the
    /// first block arrives.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Captured seconds so far, measured on the output-rate track.
    pub fn duration_secs(&self) -> f32 {
        self.segments.raw_len() as f32 / self.config.output_rate as f32
    }

    pub fn raw_sample_count(&self) -> usize {
        self.segments.raw_len()
    }

    pub(super) fn raw_samples(&self) -> &[i16] {
        self.segments.raw()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn has_chunk(&self) -> bool {
        self.segments.has_pending()
    }

    pub fn chunk_sequence(&self) -> u64 {
        self.segments.sequence()
    }

    /// Claim the ready chunk, if any, clearing the slot so the next
    /// boundary can produce another.
    pub fn take_chunk(&mut self) -> Option<EncodedChunk> {
        let chunk = self.segments.take_pending()?;
        let (bytes, encoding) = match chunk.payload {
            ChunkPayload::Pcm(samples) => (
                encode_wav(&samples, self.config.output_rate),
                ChunkEncoding::PcmWav,
            ),
            ChunkPayload::Mulaw(bytes) => (bytes, ChunkEncoding::Mulaw),
        };
        Some(EncodedChunk {
            bytes,
            sequence: chunk.sequence,
            encoding,
        })
    }

    /// Toggle the voice-activity gate. Disabling releases any partial frame
    /// still buffered in the gate as passing audio: there is not enough of
    /// it to judge.
    pub fn set_gate_enabled(&mut self, enabled: bool) {
        if self.gate.is_enabled() && !enabled {
            let partial = self.gate.drain_partial();
            for &sample in &partial {
                if self.segments.push_compressed(encode_mulaw(sample)).is_err() {
                    warn!("buffer growth failed; halting capture");
                    self.halted = true;
                    break;
                }
            }
        }
        self.gate.set_enabled(enabled);
    }

    pub fn gate_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Finish the recording: wrap everything captured in a WAV container
    /// and release the session. Fails when nothing was captured.
    pub fn finish(self) -> Result<Vec<u8>, SessionError> {
        if self.segments.raw_len() == 0 {
            return Err(SessionError::NoAudio);
        }
        info!(
            samples = self.segments.raw_len(),
            secs = f64::from(self.duration_secs()),
            "recording session finished"
        );
        Ok(encode_wav(self.segments.raw(), self.config.output_rate))
    }
}
