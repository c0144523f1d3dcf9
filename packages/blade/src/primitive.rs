//! BLAKE3 collaborator
//!
//! The pipeline only ever talks to BLAKE3 through this module: plain digest,
//! keyed digest, extendable output and the incremental hasher.

/// Sub-digest output (32 bytes)
pub type Hash = [u8; 32];

/// Length of a BLAKE3 key
pub const KEY_LEN: usize = blake3::KEY_LEN;

/// Plain BLAKE3 digest
#[must_use]
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Keyed BLAKE3 digest
#[must_use]
pub fn keyed_hash(key: &[u8; KEY_LEN], data: &[u8]) -> Hash {
    *blake3::keyed_hash(key, data).as_bytes()
}

/// Fill `out` with BLAKE3 extendable output over `data`
pub fn xof(data: &[u8], out: &mut [u8]) {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize_xof(out);
}

/// Incremental hasher
pub struct Hasher {
    inner: blake3::Hasher,
}

impl Hasher {
    /// Create a new hasher
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Create a keyed hasher
    #[must_use]
    pub fn new_keyed(key: &[u8; KEY_LEN]) -> Self {
        Self {
            inner: blake3::Hasher::new_keyed(key),
        }
    }

    /// Update with data
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash
    #[must_use]
    pub fn finalize(&self) -> Hash {
        *self.inner.finalize().as_bytes()
    }

    /// Finalize into an arbitrary-length output
    pub fn finalize_xof(&self, out: &mut [u8]) {
        self.inner.finalize_xof().fill(out);
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}
