//! Round loop: pad, partition, reduce every chunk, repeat on the results
//!
//! Each round turns the input into one 64-byte value per chunk. The
//! concatenation becomes the next round's input until exactly 64 bytes are
//! left, which takes O(log n) rounds.

use crate::config::BladeConfig;
use crate::pad::pad;
use crate::partition::{partition, MIN_CHUNK_SIZE};
use crate::pool::{SharedBuffer, WorkerPool};
use crate::reduce::{to_usize, Backend, ChunkReducer};
use crate::{BladeDigest, BladeError, Result, DIGEST_LEN};
use std::sync::Arc;
use tracing::{debug, trace};

/// Digest engine bound to a configuration and, optionally, a private pool
///
/// Without a private pool the process-wide [`WorkerPool::global`] is used,
/// and only created once a call actually needs it.
#[derive(Debug, Clone, Default)]
pub struct Blade {
    config: BladeConfig,
    pool: Option<Arc<WorkerPool>>,
}

impl Blade {
    /// Engine using the process-wide pool
    #[must_use]
    pub fn new(config: BladeConfig) -> Self {
        Self { config, pool: None }
    }

    /// Engine using its own pool
    #[must_use]
    pub fn with_pool(config: BladeConfig, pool: Arc<WorkerPool>) -> Self {
        Self {
            config,
            pool: Some(pool),
        }
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &BladeConfig {
        &self.config
    }

    /// Digest `input`
    ///
    /// # Errors
    ///
    /// Returns `BladeError::InvalidInputSize` for inputs that are neither 64
    /// bytes nor at least 128 bytes, and propagates allocation and worker
    /// failures.
    pub fn digest(&self, input: &[u8]) -> Result<BladeDigest> {
        let mut out = [0u8; DIGEST_LEN];
        let rounds = self.run(Some(input), input.len(), &mut out)?;
        Ok(BladeDigest::new(out, rounds))
    }

    /// Digest `input` into `output`, which must be exactly 64 bytes
    ///
    /// # Errors
    ///
    /// Returns `BladeError::InvalidOutputSize` if `output` is not 64 bytes,
    /// otherwise as [`digest`](Self::digest).
    pub fn digest_into(&self, input: &[u8], output: &mut [u8]) -> Result<()> {
        self.run(Some(input), input.len(), output).map(|_| ())
    }

    /// Shared entry for present and absent inputs; returns the round count
    pub(crate) fn run(&self, input: Option<&[u8]>, len: usize, output: &mut [u8]) -> Result<u32> {
        if output.len() != DIGEST_LEN {
            return Err(BladeError::InvalidOutputSize {
                expected: DIGEST_LEN,
                actual: output.len(),
            });
        }
        let input = match input {
            Some(bytes) => bytes,
            None if len == 0 => &[],
            None => return Err(BladeError::NullInput),
        };

        let mut current: Option<Vec<u8>> = None;
        let mut rounds = 0u32;
        loop {
            let data = current.as_deref().unwrap_or(input);
            if data.len() == DIGEST_LEN {
                output.copy_from_slice(data);
                trace!(rounds, "Digest complete");
                return Ok(rounds);
            }
            if data.len() < MIN_CHUNK_SIZE as usize {
                return Err(BladeError::InvalidInputSize(data.len()));
            }

            let next = self.round(data)?;
            rounds += 1;
            trace!(round = rounds, from = data.len(), to = next.len(), "Round reduced");
            current = Some(next);
        }
    }

    fn round(&self, data: &[u8]) -> Result<Vec<u8>> {
        let padded: SharedBuffer = Arc::new(pad(data)?);
        let chunks = partition(padded.len() as u64)?;
        let max_chunk = chunks.first().copied().unwrap_or(MIN_CHUNK_SIZE);

        let backend = self.backend(padded.len())?;
        debug!(
            len = data.len(),
            padded = padded.len(),
            chunks = chunks.len(),
            parallel = backend.is_parallel(),
            "Blade round"
        );

        let mut reducer = ChunkReducer::new(max_chunk, backend)?;
        let mut collected = Vec::new();
        collected.try_reserve_exact(chunks.len() * DIGEST_LEN)?;

        let mut offset = 0usize;
        for &chunk in &chunks {
            let value = reducer.reduce(&padded, offset, chunk)?;
            collected.extend_from_slice(&value);
            offset += to_usize(chunk)?;
        }
        Ok(collected)
    }

    fn backend(&self, padded_len: usize) -> Result<Backend<'_>> {
        let pool = match &self.pool {
            Some(pool) => {
                if self.config.wants_pool(padded_len, || pool.live_workers()) {
                    Some(pool.as_ref())
                } else {
                    None
                }
            }
            None => {
                // Only touch the global pool once it is actually needed
                let wanted = self.config.wants_pool(padded_len, || {
                    WorkerPool::global().map_or(1, WorkerPool::live_workers)
                });
                if wanted {
                    Some(WorkerPool::global()?)
                } else {
                    None
                }
            }
        };
        Ok(pool.map_or(Backend::Serial, Backend::Pool))
    }
}

/// Digest `input` with the default configuration
///
/// # Errors
///
/// See [`Blade::digest`].
pub fn digest(input: &[u8]) -> Result<BladeDigest> {
    Blade::default().digest(input)
}

/// Digest `input` into `output` with `config`
///
/// # Errors
///
/// See [`Blade::digest_into`].
pub fn digest_into(input: &[u8], output: &mut [u8], config: &BladeConfig) -> Result<()> {
    Blade::new(config.clone()).digest_into(input, output)
}
