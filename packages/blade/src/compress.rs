//! Tweaked block compression
//!
//! One 64-byte block is compressed into one 32-byte sub-digest. The key for
//! the final keyed BLAKE3 call is derived from a tweaked copy of the block, so
//! identical blocks at different chunk sizes or levels compress differently.

use crate::primitive::{self, Hash};
use crate::{BladeError, Result};
use std::ops::Range;

/// Size of one block (one couple)
pub const BLOCK_LEN: usize = 64;

/// Size of one compressed sub-digest
pub const SUB_DIGEST_LEN: usize = 32;

/// Domain-separation pair carried by every compression call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tweak {
    /// Size of the chunk being reduced
    pub chunk_size: u64,
    /// Level inside that chunk, starting at 0
    pub iteration: u64,
}

impl Tweak {
    /// Create a new tweak
    #[must_use]
    pub const fn new(chunk_size: u64, iteration: u64) -> Self {
        Self {
            chunk_size,
            iteration,
        }
    }

    #[inline]
    fn rotation(self) -> u32 {
        // Always < 64
        (self.iteration % 64) as u32
    }
}

/// Compress one block into a sub-digest
#[must_use]
pub fn compress_block(block: &[u8; BLOCK_LEN], tweak: Tweak) -> Hash {
    let mut seed_input = *block;
    for word in seed_input.chunks_exact_mut(8) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(word);
        let w = u64::from_le_bytes(bytes);
        let w = !(w.rotate_left(tweak.rotation()) ^ tweak.chunk_size);
        word.copy_from_slice(&w.to_le_bytes());
    }

    let seed = primitive::hash(&seed_input);
    primitive::keyed_hash(&seed, block)
}

/// Checked slice form of [`compress_block`]
///
/// # Errors
///
/// Returns `BladeError::InvalidBlockSize` if `block` is not 64 bytes or `out`
/// is not 32 bytes.
pub fn compress(block: &[u8], out: &mut [u8], tweak: Tweak) -> Result<()> {
    let block: &[u8; BLOCK_LEN] = block.try_into().map_err(|_| BladeError::InvalidBlockSize {
        expected: BLOCK_LEN,
        actual: block.len(),
    })?;
    if out.len() != SUB_DIGEST_LEN {
        return Err(BladeError::InvalidBlockSize {
            expected: SUB_DIGEST_LEN,
            actual: out.len(),
        });
    }
    out.copy_from_slice(&compress_block(block, tweak));
    Ok(())
}

/// Compress `couples` consecutive blocks of `src` into consecutive
/// sub-digests of `dst`, stopping at the first failure.
///
/// # Errors
///
/// Returns `BladeError::InvalidBlockSize` if `src` does not hold exactly
/// `couples` blocks or `dst` cannot hold `couples` sub-digests.
pub fn compress_batch(src: &[u8], couples: usize, dst: &mut [u8], tweak: Tweak) -> Result<()> {
    let range = block_range(src.len(), 0, couples)?;
    if range.end != src.len() {
        return Err(BladeError::InvalidBlockSize {
            expected: range.end,
            actual: src.len(),
        });
    }
    let available = dst.len();
    let dst = dst
        .get_mut(..couples * SUB_DIGEST_LEN)
        .ok_or(BladeError::InvalidBlockSize {
            expected: couples * SUB_DIGEST_LEN,
            actual: available,
        })?;

    for (block, out) in src
        .chunks_exact(BLOCK_LEN)
        .zip(dst.chunks_exact_mut(SUB_DIGEST_LEN))
    {
        compress(block, out, tweak)?;
    }
    Ok(())
}

/// Byte range of `couples` blocks starting at `offset` in a buffer of `len`
/// bytes
///
/// # Errors
///
/// Returns `BladeError::InvalidBlockSize` if the range overflows or runs past
/// `len`.
pub(crate) fn block_range(len: usize, offset: usize, couples: usize) -> Result<Range<usize>> {
    couples
        .checked_mul(BLOCK_LEN)
        .and_then(|bytes| offset.checked_add(bytes))
        .filter(|&end| end <= len)
        .map(|end| offset..end)
        .ok_or(BladeError::InvalidBlockSize {
            expected: offset.saturating_add(couples.saturating_mul(BLOCK_LEN)),
            actual: len,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_is_deterministic() {
        let block = [7u8; BLOCK_LEN];
        let tweak = Tweak::new(256, 1);
        assert_eq!(compress_block(&block, tweak), compress_block(&block, tweak));
    }

    #[test]
    fn test_tweak_separates_levels_and_chunks() {
        let block = [0xA5u8; BLOCK_LEN];
        let base = compress_block(&block, Tweak::new(256, 0));
        assert_ne!(base, compress_block(&block, Tweak::new(256, 1)));
        assert_ne!(base, compress_block(&block, Tweak::new(512, 0)));
    }

    #[test]
    fn test_rotation_wraps_at_64() {
        let block: [u8; BLOCK_LEN] = std::array::from_fn(|i| i as u8);
        assert_eq!(
            compress_block(&block, Tweak::new(128, 3)),
            compress_block(&block, Tweak::new(128, 67))
        );
    }

    #[test]
    fn test_keyed_by_tweaked_seed() {
        let block = [0u8; BLOCK_LEN];
        let tweak = Tweak::new(128, 0);
        // Zero words rotate to zero, xor the chunk size, then invert
        let mut seed_input = [0u8; BLOCK_LEN];
        for word in seed_input.chunks_exact_mut(8) {
            word.copy_from_slice(&(!128u64).to_le_bytes());
        }
        let seed = primitive::hash(&seed_input);
        assert_eq!(
            compress_block(&block, tweak),
            primitive::keyed_hash(&seed, &block)
        );
    }

    #[test]
    fn test_compress_rejects_bad_sizes() {
        let mut out = [0u8; SUB_DIGEST_LEN];
        assert_eq!(
            compress(&[0u8; 63], &mut out, Tweak::new(128, 0)),
            Err(BladeError::InvalidBlockSize {
                expected: BLOCK_LEN,
                actual: 63
            })
        );
        let mut short = [0u8; 31];
        assert!(compress(&[0u8; BLOCK_LEN], &mut short, Tweak::new(128, 0)).is_err());
    }

    #[test]
    fn test_batch_matches_individual_blocks() {
        let src: Vec<u8> = (0..4 * BLOCK_LEN).map(|i| (i % 251) as u8).collect();
        let tweak = Tweak::new(256, 2);
        let mut dst = vec![0u8; 4 * SUB_DIGEST_LEN];
        assert!(compress_batch(&src, 4, &mut dst, tweak).is_ok());

        for (i, block) in src.chunks_exact(BLOCK_LEN).enumerate() {
            let mut expected = [0u8; SUB_DIGEST_LEN];
            assert!(compress(block, &mut expected, tweak).is_ok());
            assert_eq!(&dst[i * SUB_DIGEST_LEN..(i + 1) * SUB_DIGEST_LEN], &expected);
        }
    }

    #[test]
    fn test_batch_rejects_short_destination() {
        let src = vec![0u8; 2 * BLOCK_LEN];
        let mut dst = vec![0u8; SUB_DIGEST_LEN];
        assert!(compress_batch(&src, 2, &mut dst, Tweak::new(128, 0)).is_err());
        assert!(compress_batch(&src, 3, &mut vec![0u8; 96], Tweak::new(128, 0)).is_err());
    }

    #[test]
    fn test_block_range_is_checked() {
        assert_eq!(block_range(256, 64, 2), Ok(64..192));
        assert_eq!(block_range(256, 0, 4), Ok(0..256));
        assert!(matches!(
            block_range(256, 128, 3),
            Err(BladeError::InvalidBlockSize { expected: 320, actual: 256 })
        ));
        assert!(block_range(256, usize::MAX - 10, 1).is_err());
        assert!(block_range(usize::MAX, 0, usize::MAX / 8).is_err());
    }

    #[test]
    fn test_batch_rejects_overflowing_couples() {
        let mut dst = [0u8; SUB_DIGEST_LEN];
        assert!(matches!(
            compress_batch(&[0u8; BLOCK_LEN], usize::MAX / 2, &mut dst, Tweak::new(128, 0)),
            Err(BladeError::InvalidBlockSize { .. })
        ));
    }
}
