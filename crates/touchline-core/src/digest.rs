//! Limits-file digest for plant traceability.
//!
//! Every campaign summary records the SHA-256 of the raw limits file so a
//! failed panel can be traced back to the exact limit set it was judged
//! against.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a limits file.
///
/// The inner field is private to guarantee the string is always lowercase
/// hex produced by `from_bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimitsDigest(String);

impl LimitsDigest {
    /// Compute the digest of the raw file bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        LimitsDigest(hex::encode(hasher.finalize()))
    }

    /// Full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars) for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for LimitsDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_hex() {
        let digest = LimitsDigest::from_bytes(b"NUM_OF_ROW=18\n");
        assert_eq!(digest.as_str().len(), 64);
        assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, LimitsDigest::from_bytes(b"NUM_OF_ROW=18\n"));
        assert_eq!(digest.short().len(), 12);
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = LimitsDigest::from_bytes(b"NOISE_TEST_LIMIT=40");
        let b = LimitsDigest::from_bytes(b"NOISE_TEST_LIMIT=41");
        assert_ne!(a, b);
    }
}
