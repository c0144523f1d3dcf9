//! In-place diffusion over a freshly compressed level
//!
//! Windows are 16 bytes wide on a 12-byte stride, so neighbouring windows
//! share 4 bytes and each window reads what the previous one just wrote.

/// Number of sequential rounds
pub const ROUNDS: usize = 11;

const WINDOW: usize = 16;
const STRIDE: usize = 12;

#[inline]
fn read_u64_le(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

#[inline]
fn write_u64_le(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Rotation used by `round`
#[inline]
#[must_use]
pub const fn rotation(round: usize) -> u32 {
    ((3 * round + 1) % 64) as u32
}

/// Run all diffusion rounds over `buf`
pub fn diffuse(buf: &mut [u8]) {
    for round in 0..ROUNDS {
        let r = rotation(round);
        let mut offset = 0;
        while offset + WINDOW <= buf.len() {
            let a = read_u64_le(buf, offset);
            let b = read_u64_le(buf, offset + 8);
            let a = a.rotate_left(r) ^ b;
            let b = b.rotate_left(r) ^ a;
            write_u64_le(buf, offset, a);
            write_u64_le(buf, offset + 8, b);
            offset += STRIDE;
        }
    }
}
