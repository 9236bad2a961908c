//! Chunk/segment buffering with growable storage.
//!
//! Tracks own the captured streams. Storage grows in fixed increments and
//! growth failure is surfaced as an error, so the session can halt in place
//! without losing anything already committed. Chunk boundaries are detected
//! on the raw track; a completed chunk is detached into a single pending
//! slot that must be claimed before the next boundary can produce another.

use std::collections::TryReserveError;
use tracing::debug;

/// Growable sample storage with fixed-increment growth.
///
/// `Vec` would grow amortized-doubling on its own; reserving explicitly
/// keeps the increments predictable and turns allocation failure into a
/// recoverable error instead of an abort.
#[derive(Debug, Clone)]
pub(super) struct Track<T> {
    buf: Vec<T>,
    grow: usize,
    capacity: usize,
}

impl<T: Copy> Track<T> {
    pub(super) fn with_capacity(initial: usize, grow: usize) -> Result<Self, TryReserveError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(initial)?;
        Ok(Self {
            buf,
            grow: grow.max(1),
            capacity: initial,
        })
    }

    pub(super) fn push(&mut self, value: T) -> Result<(), TryReserveError> {
        if self.buf.len() == self.capacity {
            self.buf.try_reserve_exact(self.grow)?;
            self.capacity += self.grow;
        }
        self.buf.push(value);
        Ok(())
    }

    pub(super) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(super) fn as_slice(&self) -> &[T] {
        &self.buf
    }

    #[cfg(test)]
    pub(super) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy out everything written so far and reset the write cursor,
    /// keeping the allocation. Returns `None` when the copy cannot be
    /// allocated; the data stays in place for a later attempt.
    pub(super) fn take_all(&mut self) -> Option<Vec<T>> {
        let mut out = Vec::new();
        if out.try_reserve_exact(self.buf.len()).is_err() {
            return None;
        }
        out.extend_from_slice(&self.buf);
        self.buf.clear();
        Some(out)
    }

    /// Copy of the last `count` values, or `None` if there are fewer than
    /// `count` or the copy cannot be allocated.
    pub(super) fn tail(&self, count: usize) -> Option<Vec<T>> {
        if self.buf.len() < count {
            return None;
        }
        let mut out = Vec::new();
        if out.try_reserve_exact(count).is_err() {
            return None;
        }
        out.extend_from_slice(&self.buf[self.buf.len() - count..]);
        Some(out)
    }
}

/// Payload of a detached chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkPayload {
    /// Output-rate PCM samples (plain variant).
    Pcm(Vec<i16>),
    /// μ-law bytes accumulated since the previous boundary (compressed
    /// variant); may be shorter than the nominal chunk when the gate
    /// dropped silent frames.
    Mulaw(Vec<u8>),
}

/// A completed slice of the stream waiting to be claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChunk {
    pub payload: ChunkPayload,
    pub sequence: u64,
}

/// Owns the raw (and optionally compressed) tracks and the chunk slot.
#[derive(Debug)]
pub(super) struct SegmentBuffer {
    raw: Track<i16>,
    compressed: Option<Track<u8>>,
    chunk_samples: usize,
    pending: Option<PendingChunk>,
    sequence: u64,
}

impl SegmentBuffer {
    pub(super) fn new(
        initial_samples: usize,
        grow_samples: usize,
        chunk_samples: usize,
        compressed: bool,
    ) -> Result<Self, TryReserveError> {
        let compressed = if compressed {
            Some(Track::with_capacity(initial_samples, grow_samples)?)
        } else {
            None
        };
        Ok(Self {
            raw: Track::with_capacity(initial_samples, grow_samples)?,
            compressed,
            chunk_samples: chunk_samples.max(1),
            pending: None,
            sequence: 0,
        })
    }

    /// Append one output-rate sample to the raw track. Boundary detection
    /// is a separate step (`roll_boundary`) so the caller can finish the
    /// sample's compression first and a chunk never splits a frame's bytes.
    pub(super) fn append_raw(&mut self, sample: i16) -> Result<(), TryReserveError> {
        self.raw.push(sample)
    }

    /// Materialize a chunk when the raw write cursor sits on a chunk
    /// boundary. Called once per committed sample, after its compressed
    /// bytes (if any) have landed.
    pub(super) fn roll_boundary(&mut self) {
        if self.raw.len() > 0 && self.raw.len() % self.chunk_samples == 0 {
            self.materialize_chunk();
        }
    }

    /// Append one μ-law byte to the compressed track; no-op for sessions
    /// without one.
    pub(super) fn push_compressed(&mut self, byte: u8) -> Result<(), TryReserveError> {
        match &mut self.compressed {
            Some(track) => track.push(byte),
            None => Ok(()),
        }
    }

    /// A boundary with an unclaimed chunk still in the slot is skipped; the
    /// compressed track keeps accumulating until a later boundary finds the
    /// slot free.
    fn materialize_chunk(&mut self) {
        if self.pending.is_some() {
            debug!(
                raw_samples = self.raw.len(),
                sequence = self.sequence,
                "chunk boundary skipped: previous chunk unclaimed"
            );
            return;
        }
        let payload = match &mut self.compressed {
            Some(track) => track.take_all().map(ChunkPayload::Mulaw),
            None => self.raw.tail(self.chunk_samples).map(ChunkPayload::Pcm),
        };
        let Some(payload) = payload else { return };
        self.sequence += 1;
        debug!(sequence = self.sequence, "chunk ready");
        self.pending = Some(PendingChunk {
            payload,
            sequence: self.sequence,
        });
    }

    pub(super) fn take_pending(&mut self) -> Option<PendingChunk> {
        self.pending.take()
    }

    pub(super) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(super) fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(super) fn raw_len(&self) -> usize {
        self.raw.len()
    }

    pub(super) fn raw(&self) -> &[i16] {
        self.raw.as_slice()
    }

    #[cfg(test)]
    pub(super) fn compressed_len(&self) -> usize {
        self.compressed.as_ref().map(Track::len).unwrap_or(0)
    }
}
