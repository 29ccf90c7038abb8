//! Authenticated messages
//!
//! A plaintext travels with a signed descriptor carrying its SHA-256 hash.
//! Verification runs two independent checks and reports which one failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{
    canonical_bytes, AuthFailure, CryptoError, CryptoResult, Hash, Identity, PublicKey,
    SignatureBytes,
};

/// The signed part of an authenticated message
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDescriptor {
    /// Claimed sender
    pub sender_id: String,
    /// When the message was authenticated
    pub timestamp: DateTime<Utc>,
    /// Hex SHA-256 of the plaintext
    pub hash: String,
}

/// Plaintext plus its signed descriptor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedMessage {
    /// The message body
    pub text: String,
    /// Sender, timestamp and hash of `text`
    pub descriptor: MessageDescriptor,
    /// RSA-PSS signature over the descriptor's canonical bytes
    pub signature: SignatureBytes,
}

/// Message integrity and authentication operations
pub struct MessageIntegrity;

impl MessageIntegrity {
    /// Hex SHA-256 of a message
    pub fn hash_message(text: &str) -> String {
        Hash::hash_hex(text.as_bytes())
    }

    /// Whether `text` hashes to `expected_hash`
    pub fn verify_message_integrity(text: &str, expected_hash: &str) -> bool {
        Hash::verify_hex(text.as_bytes(), expected_hash)
    }

    /// Wrap `text` in a descriptor signed by `sender`
    pub fn create_authenticated_message(
        text: &str,
        sender_id: &str,
        sender: &Identity,
    ) -> CryptoResult<AuthenticatedMessage> {
        let descriptor = MessageDescriptor {
            sender_id: sender_id.to_string(),
            timestamp: Utc::now(),
            hash: Self::hash_message(text),
        };
        let signature = sender.sign(&canonical_bytes(&descriptor)?)?;

        Ok(AuthenticatedMessage {
            text: text.to_string(),
            descriptor,
            signature,
        })
    }

    /// Check integrity, then authenticity, returning the verified text
    pub fn verify_authenticated_message(
        message: &AuthenticatedMessage,
        sender_public: &PublicKey,
    ) -> CryptoResult<String> {
        if !Self::verify_message_integrity(&message.text, &message.descriptor.hash) {
            return Err(CryptoError::AuthenticationFailed(
                AuthFailure::IntegrityMismatch,
            ));
        }

        let payload = canonical_bytes(&message.descriptor)?;
        sender_public
            .verify(&payload, &message.signature)
            .map_err(|_| CryptoError::AuthenticationFailed(AuthFailure::InvalidSignature))?;

        Ok(message.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::identity::tests::fixtures;

    #[test]
    fn test_create_and_verify() {
        let (alice, _) = fixtures();

        let msg = MessageIntegrity::create_authenticated_message("hello", "alice", alice).unwrap();
        assert_eq!(msg.descriptor.sender_id, "alice");
        assert_eq!(msg.descriptor.hash, MessageIntegrity::hash_message("hello"));

        let text = MessageIntegrity::verify_authenticated_message(&msg, alice.public_key()).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_tampered_text_fails_integrity() {
        let (alice, _) = fixtures();

        let mut msg = MessageIntegrity::create_authenticated_message("pay 100", "alice", alice).unwrap();
        msg.text = "pay 900".into();

        assert_eq!(
            MessageIntegrity::verify_authenticated_message(&msg, alice.public_key()),
            Err(CryptoError::AuthenticationFailed(AuthFailure::IntegrityMismatch))
        );
    }

    #[test]
    fn test_wrong_sender_key_fails_signature() {
        let (alice, bob) = fixtures();

        let msg = MessageIntegrity::create_authenticated_message("hello", "alice", alice).unwrap();
        assert_eq!(
            MessageIntegrity::verify_authenticated_message(&msg, bob.public_key()),
            Err(CryptoError::AuthenticationFailed(AuthFailure::InvalidSignature))
        );
    }

    #[test]
    fn test_forged_descriptor_fails_signature() {
        let (alice, _) = fixtures();

        let mut msg = MessageIntegrity::create_authenticated_message("hello", "alice", alice).unwrap();
        // Text and hash changed consistently, so only the signature can catch it
        msg.text = "goodbye".into();
        msg.descriptor.hash = MessageIntegrity::hash_message("goodbye");

        assert_eq!(
            MessageIntegrity::verify_authenticated_message(&msg, alice.public_key()),
            Err(CryptoError::AuthenticationFailed(AuthFailure::InvalidSignature))
        );
    }

    #[test]
    fn test_impersonated_sender_id_fails_signature() {
        let (alice, _) = fixtures();

        let mut msg = MessageIntegrity::create_authenticated_message("hello", "alice", alice).unwrap();
        msg.descriptor.sender_id = "hub".into();

        assert!(matches!(
            MessageIntegrity::verify_authenticated_message(&msg, alice.public_key()),
            Err(CryptoError::AuthenticationFailed(AuthFailure::InvalidSignature))
        ));
    }

    #[test]
    fn test_survives_json_transport() {
        let (alice, _) = fixtures();

        let msg = MessageIntegrity::create_authenticated_message("{\"k\":1}", "alice", alice).unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        let restored: AuthenticatedMessage = serde_json::from_str(&json).unwrap();

        assert_eq!(
            MessageIntegrity::verify_authenticated_message(&restored, alice.public_key()).unwrap(),
            "{\"k\":1}"
        );
    }

    #[test]
    fn test_integrity_helpers() {
        let hash = MessageIntegrity::hash_message("abc");
        assert!(MessageIntegrity::verify_message_integrity("abc", &hash));
        assert!(!MessageIntegrity::verify_message_integrity("abd", &hash));
    }
}
