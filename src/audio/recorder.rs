//! System microphone capture via CPAL.
//!
//! The recorder owns the input stream and the live session. Format and
//! channel-count normalization happen in the stream callback, which then
//! runs the whole pipeline synchronously on the captured block. Control
//! operations mirror the session surface and are safe to call from another
//! thread than the one the stream delivers on.

use super::dispatch::{append_downmixed_samples, f32_to_i16, u16_to_i16};
use super::meter::LiveMeter;
use super::session::{BlockStatus, EncodedChunk, Session, SessionConfig, SessionError};
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// Audio input device wrapper driving a recording session.
pub struct Recorder {
    device: cpal::Device,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    // Held only so the stream stays alive; dropped first on stop so the
    // callback is torn down before the session is consumed.
    stream: cpal::Stream,
    session: Arc<Mutex<Session>>,
    meter: LiveMeter,
}

impl Recorder {
    /// List microphone names so a front-end can expose a selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Create a recorder, optionally forcing a specific device when the
    /// machine exposes several inputs.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .context("no default input device available")?,
        };
        Ok(Self {
            device,
            active: None,
        })
    }

    /// Get the name of the active recording device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Begin capturing. The configured native rate is replaced with the
    /// device's actual rate; the fractional converter absorbs whatever
    /// ratio that produces. Fails when a session is already live or the
    /// initial buffers cannot be allocated.
    pub fn start(&mut self, config: SessionConfig) -> Result<()> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyRecording.into());
        }

        let default_config = self.device.default_input_config()?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let channels = usize::from(device_config.channels.max(1));

        let mut config = config;
        config.native_rate = device_config.sample_rate.0;
        let session = Arc::new(Mutex::new(Session::new(config)?));
        let meter = LiveMeter::new();

        let err_fn = |err| warn!(%err, "audio stream error");
        let stream = match format {
            SampleFormat::F32 => {
                let session = session.clone();
                let meter = meter.clone();
                let mut scratch = Vec::new();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        scratch.clear();
                        append_downmixed_samples(&mut scratch, data, channels, f32_to_i16);
                        feed_block(&session, &meter, &scratch);
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let session = session.clone();
                let meter = meter.clone();
                let mut scratch = Vec::new();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        scratch.clear();
                        append_downmixed_samples(&mut scratch, data, channels, |sample| sample);
                        feed_block(&session, &meter, &scratch);
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let session = session.clone();
                let meter = meter.clone();
                let mut scratch = Vec::new();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        scratch.clear();
                        append_downmixed_samples(&mut scratch, data, channels, u16_to_i16);
                        feed_block(&session, &meter, &scratch);
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream.play()?;
        self.active = Some(ActiveCapture {
            stream,
            session,
            meter,
        });
        Ok(())
    }

    /// Stop capturing and return everything recorded as WAV bytes. The
    /// stream is torn down before the session is consumed, so feeding
    /// terminates deterministically; an unclaimed chunk is released.
    pub fn stop(&mut self) -> Result<Vec<u8>> {
        let ActiveCapture {
            stream,
            session,
            meter,
        } = self.active.take().ok_or(SessionError::NotRecording)?;
        drop(stream);
        meter.set(0.0);
        let session = Arc::try_unwrap(session)
            .map_err(|_| anyhow!("capture callback still holds the session"))?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(session.finish()?)
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// True when buffer growth failed and the session stopped accepting
    /// samples. The audio captured before the failure is still returned by
    /// `stop`.
    pub fn is_halted(&self) -> bool {
        self.with_session(|session| session.is_halted())
            .unwrap_or(false)
    }

    /// Current normalized RMS level; 0 when idle. Lock-free.
    pub fn level(&self) -> f32 {
        self.active
            .as_ref()
            .map(|active| active.meter.level())
            .unwrap_or(0.0)
    }

    /// Captured seconds so far; 0 when idle.
    pub fn duration_secs(&self) -> f32 {
        self.with_session(|session| session.duration_secs())
            .unwrap_or(0.0)
    }

    pub fn has_chunk(&self) -> bool {
        self.with_session(|session| session.has_chunk())
            .unwrap_or(false)
    }

    /// Claim the ready chunk, if any.
    pub fn take_chunk(&self) -> Option<EncodedChunk> {
        self.with_session(Session::take_chunk).flatten()
    }

    pub fn chunk_sequence(&self) -> u64 {
        self.with_session(|session| session.chunk_sequence())
            .unwrap_or(0)
    }

    pub fn set_gate_enabled(&self, enabled: bool) {
        let _ = self.with_session(|session| session.set_gate_enabled(enabled));
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.active.as_ref().map(|active| {
            let mut session = active
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            f(&mut session)
        })
    }

    #[cfg(test)]
    pub(super) fn new_for_tests() -> Option<Self> {
        let host = cpal::default_host();
        host.default_input_device().map(|device| Self {
            device,
            active: None,
        })
    }
}

fn feed_block(session: &Mutex<Session>, meter: &LiveMeter, block: &[i16]) {
    let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
    if session.process_block(block) == BlockStatus::Continue {
        meter.set(session.level());
    }
}
