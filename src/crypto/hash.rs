//! SHA-256 Hashing
//!
//! Digests are exchanged as lowercase hex strings inside signed descriptors.

use sha2::{Digest, Sha256};

/// Size of a hash output in bytes
pub const HASH_SIZE: usize = 32;

/// A hash output
pub type HashOutput = [u8; HASH_SIZE];

/// Hashing operations
pub struct Hash;

impl Hash {
    /// Compute hash of data
    pub fn hash(data: &[u8]) -> HashOutput {
        Sha256::digest(data).into()
    }

    /// Compute hash and return as hex string
    pub fn hash_hex(data: &[u8]) -> String {
        hex::encode(Self::hash(data))
    }

    /// Verify that data matches expected hash
    pub fn verify(data: &[u8], expected: &HashOutput) -> bool {
        let computed = Self::hash(data);
        constant_time_eq(&computed, expected)
    }

    /// Verify that data matches an expected hex digest
    ///
    /// Malformed hex never matches.
    pub fn verify_hex(data: &[u8], expected_hex: &str) -> bool {
        match hex::decode(expected_hex) {
            Ok(expected) => constant_time_eq(&Self::hash(data), &expected),
            Err(_) => false,
        }
    }

    /// Short fingerprint of some data, for logs and reports
    pub fn fingerprint(data: &[u8]) -> String {
        let mut hex = Self::hash_hex(data);
        hex.truncate(16);
        hex
    }
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"Hello, Conveyance!";
        assert_eq!(Hash::hash(data), Hash::hash(data));
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            Hash::hash_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_different_inputs() {
        assert_ne!(Hash::hash(b"input1"), Hash::hash(b"input2"));
    }

    #[test]
    fn test_hash_verify() {
        let data = b"test data";
        let hash = Hash::hash(data);

        assert!(Hash::verify(data, &hash));
        assert!(!Hash::verify(b"wrong data", &hash));
    }

    #[test]
    fn test_verify_hex() {
        let hex = Hash::hash_hex(b"contract");

        assert!(Hash::verify_hex(b"contract", &hex));
        assert!(!Hash::verify_hex(b"contracts", &hex));
        assert!(!Hash::verify_hex(b"contract", "not-hex"));
    }

    #[test]
    fn test_fingerprint_length() {
        assert_eq!(Hash::fingerprint(b"key").len(), 16);
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8; 32];
        let b = [1u8; 32];
        let c = [2u8; 32];

        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &c[..16]));
    }
}
