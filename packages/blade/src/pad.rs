//! Padding to a whole number of minimum chunks
//!
//! Filler is the BLAKE3 extendable output of the unpadded input, so padding
//! is a deterministic function of the original bytes.

use crate::partition::MIN_CHUNK_SIZE;
use crate::{primitive, BladeError, Result};
use tracing::trace;

/// Padded inputs are always a multiple of this many bytes
pub const PAD_MULTIPLE: usize = MIN_CHUNK_SIZE as usize;

/// Length of `len` bytes once padded, or `None` on overflow
#[must_use]
pub fn padded_len(len: usize) -> Option<usize> {
    len.div_ceil(PAD_MULTIPLE).checked_mul(PAD_MULTIPLE)
}

/// Copy `input` and extend it to the next multiple of 128 bytes
///
/// # Errors
///
/// Returns `BladeError::AllocationFailure` if the padded buffer cannot be
/// allocated.
pub fn pad(input: &[u8]) -> Result<Vec<u8>> {
    let target = padded_len(input.len()).ok_or_else(|| {
        BladeError::AllocationFailure(format!("{} bytes cannot be padded", input.len()))
    })?;

    let mut padded = Vec::new();
    padded.try_reserve_exact(target)?;
    padded.extend_from_slice(input);

    let filler = target - input.len();
    if filler > 0 {
        padded.resize(target, 0);
        primitive::xof(input, &mut padded[input.len()..]);
        trace!(len = input.len(), filler, "Padded input");
    }
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), Some(0));
        assert_eq!(padded_len(128), Some(128));
        assert_eq!(padded_len(129), Some(256));
        assert_eq!(padded_len(200), Some(256));
        assert_eq!(padded_len(328), Some(384));
        assert_eq!(padded_len(usize::MAX), None);
    }

    #[test]
    fn test_aligned_input_unchanged() -> Result<()> {
        let input: Vec<u8> = (0..384).map(|i| (i % 251) as u8).collect();
        assert_eq!(pad(&input)?, input);
        Ok(())
    }

    #[test]
    fn test_filler_is_xof_of_original() -> Result<()> {
        let input: Vec<u8> = (0..200).map(|i| (i % 251) as u8).collect();
        let padded = pad(&input)?;
        assert_eq!(padded.len(), 256);
        assert_eq!(padded[..200], input[..]);

        let mut filler = [0u8; 56];
        primitive::xof(&input, &mut filler);
        assert_eq!(padded[200..], filler[..]);
        assert_eq!(
            hex::encode(&padded[200..]),
            "f9c991a91ce818ab00f3bf22cef993a2f8d9ab0206f2b9efcef063bb190469662cd15ef78d700c7a3583675e3424aab574d353b72e026ad6"
        );
        Ok(())
    }

    #[test]
    fn test_padding_depends_on_every_byte() -> Result<()> {
        let a = vec![0u8; 300];
        let mut b = a.clone();
        b[0] = 1;
        assert_ne!(pad(&a)?[300..], pad(&b)?[300..]);
        Ok(())
    }
}
