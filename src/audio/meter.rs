use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Lock-free level readout shared between the capture callback and the
/// control thread. Stores the f32 bit pattern in an atomic so reading the
/// level never contends on the session lock.
#[derive(Clone, Debug)]
pub struct LiveMeter {
    level_bits: Arc<AtomicU32>,
}

impl LiveMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(0.0_f32.to_bits())),
        }
    }

    pub fn set(&self, level: f32) {
        self.level_bits.store(level.to_bits(), Ordering::Relaxed);
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }
}

impl Default for LiveMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// RMS of a native-rate block with samples normalized to [-1, 1], clamped
/// to [0, 1]. No smoothing or decay: each block overwrites the last value.
pub(super) fn block_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = f64::from(sample) / 32_768.0;
            normalized * normalized
        })
        .sum::<f64>()
        / samples.len() as f64;
    (energy.sqrt() as f32).clamp(0.0, 1.0)
}
