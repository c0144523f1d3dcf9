//! Greedy power-of-two chunk decomposition

use crate::{BladeError, Result};

/// Smallest chunk the partitioner will hand out
pub const MIN_CHUNK_SIZE: u64 = 128;

/// All 64 representable powers of two, largest first
pub const POW2_TABLE: [u64; 64] = pow2_table();

const fn pow2_table() -> [u64; 64] {
    let mut table = [0u64; 64];
    let mut i = 0;
    while i < 64 {
        table[i] = 1u64 << (63 - i);
        i += 1;
    }
    table
}

/// Split `total` into strictly descending powers of two, each at least
/// [`MIN_CHUNK_SIZE`], that sum exactly to `total`.
///
/// # Errors
///
/// Returns `BladeError::PartitionFailure` when the powers at or above the
/// floor cannot cover `total` exactly, i.e. when `total` is zero or not a
/// multiple of 128.
pub fn partition(total: u64) -> Result<Vec<u64>> {
    let mut chunks = Vec::new();
    let mut remaining = total;

    for &pow in POW2_TABLE.iter().take_while(|&&p| p >= MIN_CHUNK_SIZE) {
        if remaining == 0 {
            break;
        }
        if pow <= remaining {
            chunks.push(pow);
            remaining -= pow;
        }
    }

    if remaining == 0 && !chunks.is_empty() {
        Ok(chunks)
    } else {
        Err(BladeError::PartitionFailure {
            len: total,
            remainder: remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_descending_powers() {
        assert_eq!(POW2_TABLE[0], 1 << 63);
        assert_eq!(POW2_TABLE[63], 1);
        for pair in POW2_TABLE.windows(2) {
            assert_eq!(pair[0], pair[1] * 2);
        }
    }

    #[test]
    fn test_exact_decompositions() {
        assert_eq!(partition(128), Ok(vec![128]));
        assert_eq!(partition(256), Ok(vec![256]));
        assert_eq!(partition(384), Ok(vec![256, 128]));
        assert_eq!(partition(1920), Ok(vec![1024, 512, 256, 128]));
    }

    #[test]
    fn test_rejects_uncoverable_lengths() {
        assert!(matches!(
            partition(0),
            Err(BladeError::PartitionFailure { len: 0, remainder: 0 })
        ));
        assert_eq!(
            partition(200),
            Err(BladeError::PartitionFailure {
                len: 200,
                remainder: 72
            })
        );
        assert!(partition(127).is_err());
        assert!(partition(64).is_err());
    }

    #[test]
    fn test_largest_power() {
        assert_eq!(partition(1 << 63), Ok(vec![1 << 63]));
        let all = u64::MAX - 127;
        let chunks = partition(all).unwrap_or_default();
        assert_eq!(chunks.len(), 57);
        assert_eq!(chunks.iter().sum::<u64>(), all);
    }
}
