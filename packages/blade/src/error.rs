//! Error handling for the Blade digest pipeline

use thiserror::Error;

/// Blade-specific errors
///
/// Every failure aborts the whole computation; there is no partial digest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BladeError {
    /// Requested output buffer is not exactly one digest long
    #[error("Invalid output size: expected {expected} bytes, got {actual}")]
    InvalidOutputSize {
        /// Required output length
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Input is shorter than the minimum chunk and is not an already-final digest
    #[error("Invalid input size: {0} bytes (need exactly 64 or at least 128)")]
    InvalidInputSize(usize),

    /// Input buffer is absent while a non-zero length was declared
    #[error("Input buffer is missing for a non-empty input")]
    NullInput,

    /// Padded length could not be covered exactly by power-of-two chunks
    #[error("Partition failure: {len} bytes left a remainder of {remainder}")]
    PartitionFailure {
        /// Length that was partitioned
        len: u64,
        /// Bytes left uncovered by the decomposition
        remainder: u64,
    },

    /// A working buffer could not be allocated
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// A dispatched sub-range failed or its worker disappeared
    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    /// Compression was handed a block or output of the wrong size
    #[error("Invalid block size: expected {expected} bytes, got {actual}")]
    InvalidBlockSize {
        /// Required length
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// The worker pool was already shut down
    #[error("Worker pool has been shut down")]
    PoolShutDown,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BladeError {
    /// Create an internal error
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a worker failure error
    #[must_use]
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::WorkerFailure(msg.into())
    }
}

impl From<std::collections::TryReserveError> for BladeError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::AllocationFailure(err.to_string())
    }
}

/// Result type for Blade operations
pub type Result<T> = std::result::Result<T, BladeError>;
