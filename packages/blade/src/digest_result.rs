//! Digest value with encoding support

use crate::DIGEST_LEN;

/// A finished 64-byte Blade digest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BladeDigest {
    bytes: [u8; DIGEST_LEN],
    rounds: u32,
}

impl BladeDigest {
    pub(crate) fn new(bytes: [u8; DIGEST_LEN], rounds: u32) -> Self {
        Self { bytes, rounds }
    }

    /// Get the raw bytes of the digest
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.bytes
    }

    /// Convert to a byte array
    #[must_use]
    pub fn into_bytes(self) -> [u8; DIGEST_LEN] {
        self.bytes
    }

    /// Convert to a Vec<u8>
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Number of pad/partition/reduce rounds that produced this digest
    ///
    /// Zero when the input already was 64 bytes.
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Get the digest as a hexadecimal string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Get the digest as a base64 string
    #[must_use]
    pub fn to_base64(&self) -> String {
        use base64::{engine::general_purpose, Engine as _};
        general_purpose::STANDARD.encode(self.bytes)
    }

    /// Get the digest as a base64url string (URL-safe)
    #[must_use]
    pub fn to_base64url(&self) -> String {
        base64_url::encode(&self.bytes)
    }

    /// Digest length in bytes, always 64
    #[must_use]
    pub const fn len(&self) -> usize {
        DIGEST_LEN
    }

    /// Always false; kept for slice-like ergonomics
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl From<BladeDigest> for [u8; DIGEST_LEN] {
    fn from(digest: BladeDigest) -> Self {
        digest.bytes
    }
}

impl From<BladeDigest> for Vec<u8> {
    fn from(digest: BladeDigest) -> Self {
        digest.bytes.to_vec()
    }
}

impl AsRef<[u8]> for BladeDigest {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Display for BladeDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
