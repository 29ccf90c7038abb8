//! Hybrid-encrypted message envelopes and pairwise session keys
//!
//! Every envelope carries its own freshly generated AES-256 key, wrapped to
//! the recipient with RSA-OAEP. Session keys are a separate, symmetric-only
//! path cached per unordered party pair.
//!
//! Session establishment always generates new key material. Calling
//! [`SecureCommunication::establish_session_key`] for a pair that already
//! has a session replaces the cached key rather than reusing it; there is no
//! continuity across establishment calls.

pub mod integrity;

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::{
    Cipher, CryptoError, CryptoResult, Hash, Identity, PublicKey, SymmetricKey,
};

pub use integrity::{AuthenticatedMessage, MessageDescriptor, MessageIntegrity};

/// Algorithm tag carried by every hybrid envelope
pub const HYBRID_ALGORITHM: &str = "AES-256-CBC+RSA-OAEP-SHA256";

/// Algorithm tag carried by session-key envelopes
pub const SESSION_ALGORITHM: &str = "AES-256-CBC+SESSION";

/// One hybrid-encrypted message
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Sending party id
    pub sender: String,
    /// Receiving party id
    pub recipient: String,
    /// When the envelope was sealed
    pub timestamp: DateTime<Utc>,
    /// Symmetric key wrapped to the recipient (base64)
    pub wrapped_key: String,
    /// CBC initialization vector (base64)
    pub iv: String,
    /// Padded ciphertext (base64)
    pub ciphertext: String,
    /// Always [`HYBRID_ALGORITHM`]
    pub algorithm_tag: String,
}

/// Canonical id of an unordered party pair
///
/// Holds both ids, sorted, so distinct pairs never share a cache entry even
/// when ids contain the `_` used by the display form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String, String);

impl SessionId {
    /// Id for the pair, independent of argument order
    pub fn for_pair(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        SessionId(first.to_string(), second.to_string())
    }

    /// The two party ids, sorted
    pub fn parties(&self) -> (&str, &str) {
        (&self.0, &self.1)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}_{}", self.0, self.1)
    }
}

/// Result of establishing a session key
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishedSession {
    /// Canonical pair id the key is cached under
    pub session_id: SessionId,
    /// The session key wrapped to the peer (base64), for key transport
    pub wrapped_key: String,
    /// Fingerprint of the wrapped key
    pub fingerprint: String,
}

/// A message encrypted under a cached session key
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnvelope {
    /// Pair the key belongs to
    pub session_id: SessionId,
    /// CBC initialization vector (base64)
    pub iv: String,
    /// Padded ciphertext (base64)
    pub ciphertext: String,
    /// When the envelope was sealed
    pub timestamp: DateTime<Utc>,
    /// Always [`SESSION_ALGORITHM`]
    pub algorithm_tag: String,
}

/// Hybrid encryption plus a pairwise session-key cache
#[derive(Default)]
pub struct SecureCommunication {
    sessions: RwLock<HashMap<SessionId, SymmetricKey>>,
}

impl SecureCommunication {
    /// Create with an empty session cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal `plaintext` for `recipient_public` under a fresh key and IV
    pub fn encrypt(
        plaintext: &str,
        recipient_public: &PublicKey,
        sender_id: &str,
        recipient_id: &str,
    ) -> CryptoResult<Envelope> {
        let key = SymmetricKey::generate();
        let iv = Cipher::generate_iv();

        let ciphertext = Cipher::encrypt(&key, &iv, plaintext.as_bytes());
        let wrapped_key = recipient_public.wrap_key(&key)?;

        Ok(Envelope {
            sender: sender_id.to_string(),
            recipient: recipient_id.to_string(),
            timestamp: Utc::now(),
            wrapped_key: BASE64.encode(wrapped_key),
            iv: BASE64.encode(iv),
            ciphertext: BASE64.encode(ciphertext),
            algorithm_tag: HYBRID_ALGORITHM.to_string(),
        })
    }

    /// Open an envelope with the recipient's identity
    ///
    /// Any failure, whether a bad wrapped key, corrupted ciphertext, bad
    /// padding or non-UTF-8 content, is reported as `DecryptionFailed`.
    pub fn decrypt(envelope: &Envelope, recipient: &Identity) -> CryptoResult<String> {
        let wrapped = decode(&envelope.wrapped_key)?;
        let iv = decode(&envelope.iv)?;
        let ciphertext = decode(&envelope.ciphertext)?;

        let key = recipient.unwrap_key(&wrapped)?;
        let plaintext = Cipher::decrypt(&key, &iv, &ciphertext)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Generate a new session key for the pair and cache it
    ///
    /// Always produces fresh material, replacing any key already cached for
    /// the pair. The key is also wrapped to `peer_public` so it can be
    /// transported to the peer.
    pub fn establish_session_key(
        &self,
        party_a: &str,
        party_b: &str,
        peer_public: &PublicKey,
    ) -> CryptoResult<EstablishedSession> {
        let session_id = SessionId::for_pair(party_a, party_b);
        let key = SymmetricKey::generate();
        let wrapped = peer_public.wrap_key(&key)?;

        let replaced = self.sessions.write().insert(session_id.clone(), key).is_some();
        info!(session = %session_id, replaced, "session key established");

        Ok(EstablishedSession {
            session_id,
            fingerprint: Hash::fingerprint(&wrapped),
            wrapped_key: BASE64.encode(wrapped),
        })
    }

    /// Whether a session key is cached for the pair
    pub fn has_session(&self, party_a: &str, party_b: &str) -> bool {
        self.sessions
            .read()
            .contains_key(&SessionId::for_pair(party_a, party_b))
    }

    /// Encrypt with the pair's cached session key
    pub fn encrypt_with_session(
        &self,
        plaintext: &str,
        party_a: &str,
        party_b: &str,
    ) -> CryptoResult<SessionEnvelope> {
        let session_id = SessionId::for_pair(party_a, party_b);
        let sessions = self.sessions.read();
        let key = sessions
            .get(&session_id)
            .ok_or_else(|| CryptoError::NoSession(session_id.to_string()))?;

        let iv = Cipher::generate_iv();
        let ciphertext = Cipher::encrypt(key, &iv, plaintext.as_bytes());
        debug!(session = %session_id, "session message sealed");

        Ok(SessionEnvelope {
            session_id: session_id.clone(),
            iv: BASE64.encode(iv),
            ciphertext: BASE64.encode(ciphertext),
            timestamp: Utc::now(),
            algorithm_tag: SESSION_ALGORITHM.to_string(),
        })
    }

    /// Decrypt with the session key named in the envelope
    pub fn decrypt_with_session(&self, envelope: &SessionEnvelope) -> CryptoResult<String> {
        let sessions = self.sessions.read();
        let key = sessions
            .get(&envelope.session_id)
            .ok_or_else(|| CryptoError::NoSession(envelope.session_id.to_string()))?;

        let iv = decode(&envelope.iv)?;
        let ciphertext = decode(&envelope.ciphertext)?;
        let plaintext = Cipher::decrypt(key, &iv, &ciphertext)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }
}

fn decode(field: &str) -> CryptoResult<Vec<u8>> {
    BASE64.decode(field).map_err(|_| CryptoError::DecryptionFailed)
}
