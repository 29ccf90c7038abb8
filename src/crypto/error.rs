//! Cryptographic and protocol error types

use thiserror::Error;

/// Which of the two independent authenticated-message checks failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The recomputed plaintext hash does not match the signed descriptor
    IntegrityMismatch,
    /// The descriptor hash matched but its signature did not verify
    InvalidSignature,
    /// Validly signed, but the descriptor names a different sender
    SenderMismatch,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::IntegrityMismatch => write!(f, "message integrity check failed"),
            AuthFailure::InvalidSignature => write!(f, "sender signature is invalid"),
            AuthFailure::SenderMismatch => write!(f, "message claims a different sender"),
        }
    }
}

/// Errors that can occur in cryptographic and protocol operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Operation referenced a party with no registered keys
    #[error("Unknown party: {0}")]
    UnknownParty(String),

    /// Hybrid or session decryption failed
    ///
    /// Deliberately carries no detail about which step failed.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// An authenticated message did not verify
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(AuthFailure),

    /// The signed document text no longer matches its recorded hash
    #[error("Document has been tampered with - hash mismatch")]
    TamperDetected,

    /// A document signature did not verify over its descriptor
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// No session key is cached for the party pair
    #[error("No session established: {0}")]
    NoSession(String),

    /// The provided key has an invalid length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Keypair generation failed
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// The public key could not be parsed or exported
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signing operation failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Encryption operation failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Text encoding (base64, hex, UTF-8) was malformed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Structured payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::Serialization(err.to_string())
    }
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
