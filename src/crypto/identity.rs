//! RSA Identity management
//!
//! Provides party identity through RSA key pairs. The same keypair is used
//! for RSA-PSS signatures (documents, authenticated messages) and for
//! RSA-OAEP wrapping of symmetric keys.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::{
    pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding},
    pss::{BlindedSigningKey, Signature, VerifyingKey},
    signature::{RandomizedSigner, SignatureEncoding, Verifier},
    traits::PublicKeyParts,
    Oaep, RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::cipher::SymmetricKey;
use super::error::{CryptoError, CryptoResult};
use super::hash::Hash;

/// Default RSA modulus size in bits
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus accepted for generated keys
pub const MIN_KEY_BITS: usize = 2048;

/// A public key for signature verification and key wrapping
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Export as PEM `SubjectPublicKeyInfo`
    pub fn to_pem(&self) -> CryptoResult<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Parse a PEM `SubjectPublicKeyInfo`
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        RsaPublicKey::from_public_key_pem(pem)
            .map(PublicKey)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Export for transport: base64 over the PEM text
    pub fn to_transport(&self) -> CryptoResult<String> {
        Ok(BASE64.encode(self.to_pem()?))
    }

    /// Import from the transport encoding produced by [`PublicKey::to_transport`]
    pub fn from_transport(encoded: &str) -> CryptoResult<Self> {
        let pem_bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let pem =
            String::from_utf8(pem_bytes).map_err(|e| CryptoError::Encoding(e.to_string()))?;
        Self::from_pem(&pem)
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Short fingerprint of the PEM encoding
    pub fn fingerprint(&self) -> String {
        match self.to_pem() {
            Ok(pem) => Hash::fingerprint(pem.as_bytes()),
            Err(_) => String::from("unavailable"),
        }
    }

    /// Wrap a symmetric key with RSA-OAEP (SHA-256, MGF1-SHA-256)
    pub fn wrap_key(&self, key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
        self.0
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    /// Verify an RSA-PSS (SHA-256) signature against this public key
    pub fn verify(&self, message: &[u8], signature: &SignatureBytes) -> CryptoResult<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.0.clone());
        let sig = Signature::try_from(signature.as_bytes())
            .map_err(|_| CryptoError::SignatureVerificationFailed)?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey(rsa-{}, {})", self.bits(), self.fingerprint())
    }
}

/// A signature produced by an identity
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureBytes(Vec<u8>);

impl serde::Serialize for SignatureBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> serde::Deserialize<'de> for SignatureBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

impl SignatureBytes {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        SignatureBytes(bytes.to_vec())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to base64 text
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Create from base64 text
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        BASE64
            .decode(s.trim())
            .map(SignatureBytes)
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }
}

impl std::fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex = hex::encode(&self.0);
        write!(f, "Signature({}...)", &hex[..hex.len().min(16)])
    }
}

/// A cryptographic identity consisting of an RSA keypair
///
/// The private key is zeroized when dropped.
#[derive(Clone)]
pub struct Identity {
    public_key: PublicKey,
    private_key: RsaPrivateKey,
}

impl Identity {
    /// Generate a new random identity with a modulus of `bits`
    pub fn generate(bits: usize) -> CryptoResult<Self> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::KeyGeneration(format!(
                "modulus of {bits} bits is below the {MIN_KEY_BITS}-bit minimum"
            )));
        }
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public_key = PublicKey(RsaPublicKey::from(&private_key));

        Ok(Identity {
            public_key,
            private_key,
        })
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sign a message with RSA-PSS (SHA-256, random salt)
    ///
    /// Signing the same message twice yields different signatures; both verify.
    pub fn sign(&self, message: &[u8]) -> CryptoResult<SignatureBytes> {
        let signing_key = BlindedSigningKey::<Sha256>::new(self.private_key.clone());
        let signature = signing_key
            .try_sign_with_rng(&mut OsRng, message)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(SignatureBytes(signature.to_vec()))
    }

    /// Verify a signature (convenience method)
    pub fn verify(&self, message: &[u8], signature: &SignatureBytes) -> CryptoResult<()> {
        self.public_key.verify(message, signature)
    }

    /// Unwrap a symmetric key that was wrapped to this identity's public key
    pub fn unwrap_key(&self, wrapped: &[u8]) -> CryptoResult<SymmetricKey> {
        let bytes = self
            .private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        SymmetricKey::from_bytes(&bytes).map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
