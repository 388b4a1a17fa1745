//! Content fingerprints used as ETag validators.

use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

/// Length of a rendered fingerprint (hex-encoded SHA-256).
pub const FINGERPRINT_LEN: usize = 64;

/// Lowercase hex SHA-256 digest of a response body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The fingerprint as a header-ready string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the fingerprint, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Compare against a client-supplied validator.
    ///
    /// Exact string equality, evaluated in constant time so the comparison
    /// leaks nothing about how much of the validator matched.
    pub fn matches(&self, candidate: &str) -> bool {
        let ours = self.0.as_bytes();
        let theirs = candidate.as_bytes();
        if ours.len() != theirs.len() {
            return false;
        }
        ours.ct_eq(theirs).into()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Fingerprint {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Fingerprint {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

/// Fingerprint a complete body.
///
/// # Arguments
/// * `content` - Body bytes, possibly empty
///
/// # Returns
/// 64-character lowercase hex SHA-256 digest
pub fn fingerprint(content: &[u8]) -> Fingerprint {
    let mut fingerprinter = Fingerprinter::new();
    fingerprinter.update(content);
    fingerprinter.finish()
}

/// Incremental fingerprinting for bodies that arrive in chunks.
///
/// Feeding chunks `a` then `b` yields the same fingerprint as
/// [`fingerprint`] over `a ++ b`.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    /// Start an empty digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb the next chunk.
    pub fn update(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.hasher.update(chunk.as_ref());
        self
    }

    /// Finish and render the digest.
    pub fn finish(self) -> Fingerprint {
        Fingerprint(hex::encode(self.hasher.finalize()))
    }
}
