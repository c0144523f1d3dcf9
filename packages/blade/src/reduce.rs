//! Chunk reduction
//!
//! A chunk is halved level by level: every 64-byte couple compresses to 32
//! bytes, the new level is diffused, and the loop stops at 64 bytes. Levels
//! alternate between two lanes sized to half of the largest chunk of the call.

use crate::compress::{block_range, compress_batch, Tweak, BLOCK_LEN, SUB_DIGEST_LEN};
use crate::diffusion::diffuse;
use crate::partition::MIN_CHUNK_SIZE;
use crate::pool::{SharedBuffer, WorkerPool};
use crate::{BladeError, Result, DIGEST_LEN};
use std::sync::Arc;
use zeroize::Zeroize;

/// One halving step of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    /// Zero-based level number, also the compression tweak iteration
    pub iteration: u64,
    /// Bytes consumed by this level
    pub input_len: u64,
    /// Couples compressed at this level
    pub couples: u64,
    /// Bytes produced by this level
    pub output_len: u64,
}

/// Iterator over the levels that reduce one chunk to 64 bytes
#[derive(Debug, Clone)]
pub struct Levels {
    size: u64,
    iteration: u64,
}

/// Levels needed to reduce a chunk of `chunk_size` bytes
#[must_use]
pub fn levels(chunk_size: u64) -> Levels {
    Levels {
        size: chunk_size,
        iteration: 0,
    }
}

impl Iterator for Levels {
    type Item = Level;

    fn next(&mut self) -> Option<Level> {
        if self.size <= DIGEST_LEN as u64 {
            return None;
        }
        let couples = self.size / BLOCK_LEN as u64;
        let level = Level {
            iteration: self.iteration,
            input_len: self.size,
            couples,
            output_len: couples * SUB_DIGEST_LEN as u64,
        };
        self.size = level.output_len;
        self.iteration += 1;
        Some(level)
    }
}

/// Where a level's compression runs
#[derive(Debug, Clone, Copy)]
pub enum Backend<'p> {
    /// Sequential batch compression on the calling thread
    Serial,
    /// Split across the workers of a pool
    Pool(&'p WorkerPool),
}

impl Backend<'_> {
    fn compress_level(
        self,
        source: &SharedBuffer,
        offset: usize,
        couples: usize,
        dst: &mut [u8],
        tweak: Tweak,
    ) -> Result<()> {
        match self {
            Self::Serial => {
                let range = block_range(source.len(), offset, couples)?;
                compress_batch(&source[range], couples, dst, tweak)
            }
            Self::Pool(pool) => pool.dispatch(source, offset, couples, dst, tweak),
        }
    }

    /// Whether levels go through the worker pool
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Pool(_))
    }
}

/// Reduces chunks of one digest round, one at a time
pub struct ChunkReducer<'p> {
    lanes: [Vec<u8>; 2],
    backend: Backend<'p>,
}

impl<'p> ChunkReducer<'p> {
    /// Allocate lanes large enough for chunks up to `max_chunk` bytes
    ///
    /// # Errors
    ///
    /// Returns `BladeError::AllocationFailure` if the lanes cannot be allocated.
    pub fn new(max_chunk: u64, backend: Backend<'p>) -> Result<Self> {
        let lane_len = to_usize(max_chunk / 2)?;
        Ok(Self {
            lanes: [zeroed(lane_len)?, zeroed(lane_len)?],
            backend,
        })
    }

    /// Reduce the chunk of `input` that starts at `offset` and spans
    /// `chunk_size` bytes down to one 64-byte value
    ///
    /// # Errors
    ///
    /// Fails if `chunk_size` is not a power of two of at least 128 bytes, if it
    /// exceeds the lanes, or if any level's compression fails.
    pub fn reduce(
        &mut self,
        input: &SharedBuffer,
        offset: usize,
        chunk_size: u64,
    ) -> Result<[u8; DIGEST_LEN]> {
        if !chunk_size.is_power_of_two() || chunk_size < MIN_CHUNK_SIZE {
            return Err(BladeError::internal(format!(
                "chunk of {chunk_size} bytes is not a power of two >= {MIN_CHUNK_SIZE}"
            )));
        }
        if to_usize(chunk_size / 2)? > self.lanes[0].len() {
            return Err(BladeError::internal(format!(
                "chunk of {chunk_size} bytes exceeds reducer lanes"
            )));
        }

        let mut last_lane = 0;
        for level in levels(chunk_size) {
            let couples = to_usize(level.couples)?;
            let output_len = to_usize(level.output_len)?;
            let tweak = Tweak::new(chunk_size, level.iteration);
            let dst_lane = (level.iteration % 2) as usize;
            let mut dst = std::mem::take(&mut self.lanes[dst_lane]);

            let outcome = if level.iteration == 0 {
                self.backend
                    .compress_level(input, offset, couples, &mut dst[..output_len], tweak)
            } else {
                let src_lane = 1 - dst_lane;
                let shared = Arc::new(std::mem::take(&mut self.lanes[src_lane]));
                let outcome =
                    self.backend
                        .compress_level(&shared, 0, couples, &mut dst[..output_len], tweak);
                self.lanes[src_lane] = reclaim(shared);
                outcome
            };

            if outcome.is_ok() {
                diffuse(&mut dst[..output_len]);
            }
            self.lanes[dst_lane] = dst;
            outcome?;
            last_lane = dst_lane;
        }

        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&self.lanes[last_lane][..DIGEST_LEN]);
        Ok(out)
    }
}

impl Drop for ChunkReducer<'_> {
    fn drop(&mut self) {
        for lane in &mut self.lanes {
            lane.zeroize();
        }
    }
}

fn reclaim(shared: SharedBuffer) -> Vec<u8> {
    Arc::try_unwrap(shared).unwrap_or_else(|still_shared| still_shared.as_ref().clone())
}

fn zeroed(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, 0);
    Ok(buf)
}

pub(crate) fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        BladeError::AllocationFailure(format!("{value} bytes exceed the address space"))
    })
}
