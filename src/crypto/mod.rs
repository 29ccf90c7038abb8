//! Cryptographic primitives for Conveyance
//!
//! This module provides all the cryptographic building blocks:
//! - `identity`: RSA keypairs, PSS signatures and OAEP key wrapping
//! - `keys`: per-party key registry
//! - `cipher`: AES-256-CBC encryption
//! - `hash`: SHA-256 hashing

pub mod cipher;
pub mod error;
pub mod hash;
pub mod identity;
pub mod keys;

use serde::Serialize;
use serde_json::Value;

// Re-export commonly used types
pub use cipher::{Cipher, SymmetricKey};
pub use error::{AuthFailure, CryptoError, CryptoResult};
pub use hash::Hash;
pub use identity::{Identity, PublicKey, SignatureBytes, DEFAULT_KEY_BITS};
pub use keys::{KeyManager, RegisteredParty};

/// Generate cryptographically secure random bytes
pub fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Canonical serialization of a descriptor: compact JSON with object keys
/// sorted at every level.
///
/// These are the exact bytes that get signed and verified.
pub fn canonical_bytes<T: Serialize>(value: &T) -> CryptoResult<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(value)?);
    Ok(serde_json::to_vec(&value)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
