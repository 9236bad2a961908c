//! Voice activity gating for the compressed track.
//!
//! An energy gate, not a frequency-domain detector: each completed frame of
//! downsampled samples is classified by mean absolute amplitude. A holdover
//! counter keeps passing frames for a while after speech ends so trailing
//! word endings are not clipped. Loud non-speech noise passes and quiet
//! speech can be dropped; that trade-off is accepted.

use serde::{Deserialize, Serialize};

/// Frame length in downsampled samples (20 ms at 8 kHz).
pub const DEFAULT_GATE_FRAME_SAMPLES: usize = 160;

/// Mean absolute 16-bit amplitude a frame must exceed to count as speech.
pub const DEFAULT_GATE_THRESHOLD: u16 = 500;

/// Frames still passed after the last speech frame (500 ms at the default
/// frame length).
pub const DEFAULT_GATE_HOLDOVER_FRAMES: u32 = 25;

/// Gate tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    pub enabled: bool,
    pub frame_samples: usize,
    pub threshold: u16,
    pub holdover_frames: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_samples: DEFAULT_GATE_FRAME_SAMPLES,
            threshold: DEFAULT_GATE_THRESHOLD,
            holdover_frames: DEFAULT_GATE_HOLDOVER_FRAMES,
        }
    }
}

/// Gate output state. Exactly two states plus the holdover counter; the
/// counter only moves down while suppression is pending and only resets on
/// a speech frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum GateState {
    Pass,
    Suppressed,
}

/// A completed frame leaving the gate, with its verdict.
pub(super) struct GateFrame<'a> {
    pub(super) samples: &'a [i16],
    pub(super) pass: bool,
}

/// Frame-buffered energy gate.
///
/// Samples accumulate into a fixed-size frame; once the frame is full it is
/// classified and released as a whole, so a frame is either entirely on the
/// compressed track or entirely absent from it.
#[derive(Debug, Clone)]
pub struct EnergyGate {
    frame: Vec<i16>,
    frame_samples: usize,
    threshold: u16,
    holdover_max: u32,
    holdover: u32,
    state: GateState,
    enabled: bool,
}

impl EnergyGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            frame: Vec::with_capacity(config.frame_samples),
            frame_samples: config.frame_samples.max(1),
            threshold: config.threshold,
            holdover_max: config.holdover_frames,
            holdover: 0,
            state: GateState::Pass,
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_suppressed(&self) -> bool {
        self.state == GateState::Suppressed
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Push one downsampled sample. Returns the completed frame and its
    /// verdict once `frame_samples` samples have accumulated; the returned
    /// slice stays valid until the next call.
    pub(super) fn push(&mut self, sample: i16) -> Option<GateFrame<'_>> {
        if self.frame.len() == self.frame_samples {
            self.frame.clear();
        }
        self.frame.push(sample);
        if self.frame.len() < self.frame_samples {
            return None;
        }
        let pass = self.classify_current();
        Some(GateFrame {
            samples: &self.frame,
            pass,
        })
    }

    /// Take whatever partial frame is buffered. Too little data to judge,
    /// so the caller treats it as passing.
    pub(super) fn drain_partial(&mut self) -> Vec<i16> {
        if self.frame.len() == self.frame_samples {
            self.frame.clear();
            return Vec::new();
        }
        let partial = self.frame.clone();
        self.frame.clear();
        partial
    }

    fn classify_current(&mut self) -> bool {
        let sum: u64 = self
            .frame
            .iter()
            .map(|&sample| u64::from(sample.unsigned_abs()))
            .sum();
        let mean_abs = (sum / self.frame.len() as u64) as u32;

        if mean_abs > u32::from(self.threshold) {
            self.holdover = self.holdover_max;
            self.state = GateState::Pass;
            true
        } else if self.holdover > 0 {
            self.holdover -= 1;
            self.state = GateState::Pass;
            true
        } else {
            self.state = GateState::Suppressed;
            false
        }
    }
}
