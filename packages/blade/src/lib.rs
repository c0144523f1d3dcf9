//! Blade: a recursive, parallel 64-byte digest built on BLAKE3
//!
//! Input is padded to a multiple of 128 bytes, split into power-of-two
//! chunks, and every chunk is halved level by level with a tweaked BLAKE3
//! compression and a diffusion pass until 64 bytes remain. The per-chunk
//! results are concatenated and the process repeats until the whole input
//! has collapsed to a single 64-byte digest. Large inputs spread each level
//! across a persistent worker pool.
//!
//! ```no_run
//! use blade_hashing::{digest, BladeConfig, Blade, PoolGuard};
//!
//! # fn main() -> blade_hashing::Result<()> {
//! let _pool = PoolGuard::new();
//! let value = digest(&[0u8; 4096])?;
//! println!("{value}");
//!
//! let serial = Blade::new(BladeConfig::new().block_parallel(true));
//! assert_eq!(serial.digest(&[0u8; 4096])?, value);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod async_result;
pub mod compress;
pub mod config;
pub mod diffusion;
pub mod digest;
pub mod digest_result;
pub mod error;
pub mod pad;
pub mod partition;
pub mod pool;
pub mod primitive;
pub mod reduce;

/// Length of every Blade digest
pub const DIGEST_LEN: usize = 64;

// Re-export error types
pub use error::{BladeError, Result};

pub use api::{BladeBuilder, BladeWithHandler};
pub use async_result::{AsyncDigestResult, AsyncDigestResultWithHandler};
pub use config::BladeConfig;
pub use digest::{digest, digest_into, Blade};
pub use digest_result::BladeDigest;
pub use partition::partition;
pub use pool::{shutdown_global, PoolGuard, WorkerPool};
