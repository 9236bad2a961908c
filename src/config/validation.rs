use super::defaults::{
    MAX_CHUNK_SECS, MAX_GATE_HOLDOVER_FRAMES, MAX_RECORD_SECONDS, MIN_CHUNK_SECS,
    MIN_RECORD_SECONDS,
};
use super::AppConfig;
use anyhow::{bail, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Range-check CLI values before they reach the pipeline.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RECORD_SECONDS..=MAX_RECORD_SECONDS).contains(&self.seconds) {
            bail!(
                "--seconds must be between {MIN_RECORD_SECONDS} and {MAX_RECORD_SECONDS}, got {}",
                self.seconds
            );
        }

        if let Some(chunk_secs) = self.chunk_secs {
            if !(MIN_CHUNK_SECS..=MAX_CHUNK_SECS).contains(&chunk_secs) {
                bail!(
                    "--chunk-secs must be between {MIN_CHUNK_SECS} and {MAX_CHUNK_SECS}, got {chunk_secs}"
                );
            }
        }

        if self.gate_threshold == 0 {
            bail!("--gate-threshold must be nonzero");
        }

        if self.gate_holdover_frames > MAX_GATE_HOLDOVER_FRAMES {
            bail!(
                "--gate-holdover-frames must be at most {MAX_GATE_HOLDOVER_FRAMES}, got {}",
                self.gate_holdover_frames
            );
        }

        if let Some(device) = &self.input_device {
            if device.trim().is_empty() {
                bail!("--input-device must not be empty");
            }
        }

        Ok(())
    }
}
