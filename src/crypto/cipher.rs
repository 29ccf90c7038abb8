//! AES-256-CBC Encryption
//!
//! Block cipher in CBC mode with PKCS#7 padding. Confidentiality only:
//! integrity comes from the signed descriptors layered on top.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::{CryptoError, CryptoResult};
use super::random_bytes;

/// Size of the encryption key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// A 256-bit symmetric key, zeroized on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        SymmetricKey(random_bytes::<KEY_SIZE>())
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(SymmetricKey(arr))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey(..)")
    }
}

/// Symmetric cipher for encryption/decryption
pub struct Cipher;

impl Cipher {
    /// Generate a fresh random IV
    pub fn generate_iv() -> [u8; IV_SIZE] {
        random_bytes::<IV_SIZE>()
    }

    /// Encrypt padded plaintext under `key` and `iv`
    pub fn encrypt(key: &SymmetricKey, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
        Aes256CbcEnc::new(key.as_bytes().into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypt and strip padding
    ///
    /// Wrong IV length, ragged ciphertext and bad padding all surface as
    /// `DecryptionFailed`.
    pub fn decrypt(key: &SymmetricKey, iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        if iv.len() != IV_SIZE || ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::DecryptionFailed);
        }
        let mut iv_arr = [0u8; IV_SIZE];
        iv_arr.copy_from_slice(iv);

        Aes256CbcDec::new(key.as_bytes().into(), (&iv_arr).into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::generate();
        let iv = Cipher::generate_iv();
        let plaintext = b"Hello, Conveyance!";

        let ciphertext = Cipher::encrypt(&key, &iv, plaintext);
        let decrypted = Cipher::decrypt(&key, &iv, &ciphertext).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn test_ciphertext_is_block_padded() {
        let key = SymmetricKey::generate();
        let iv = Cipher::generate_iv();

        // A full block of input still gains a full padding block
        assert_eq!(Cipher::encrypt(&key, &iv, &[0u8; 16]).len(), 32);
        assert_eq!(Cipher::encrypt(&key, &iv, b"").len(), 16);
        assert_eq!(Cipher::encrypt(&key, &iv, &[7u8; 17]).len(), 32);
    }

    #[test]
    fn test_fresh_iv_changes_ciphertext() {
        let key = SymmetricKey::generate();
        let plaintext = b"Hello";

        let ct1 = Cipher::encrypt(&key, &Cipher::generate_iv(), plaintext);
        let ct2 = Cipher::encrypt(&key, &Cipher::generate_iv(), plaintext);

        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_wrong_key_fails_or_garbles() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();
        let iv = Cipher::generate_iv();
        let plaintext = b"Secret";

        let ciphertext = Cipher::encrypt(&key1, &iv, plaintext);
        // CBC has no tag, so a wrong key can occasionally produce valid padding
        match Cipher::decrypt(&key2, &iv, &ciphertext) {
            Ok(garbled) => assert_ne!(garbled.as_slice(), plaintext),
            Err(e) => assert_eq!(e, CryptoError::DecryptionFailed),
        }
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = SymmetricKey::generate();
        let iv = Cipher::generate_iv();

        let ciphertext = Cipher::encrypt(&key, &iv, b"some longer plaintext here");
        assert_eq!(
            Cipher::decrypt(&key, &iv, &ciphertext[..ciphertext.len() - 1]),
            Err(CryptoError::DecryptionFailed)
        );
        assert_eq!(Cipher::decrypt(&key, &iv, &[]), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn test_bad_iv_length_fails() {
        let key = SymmetricKey::generate();
        let iv = Cipher::generate_iv();
        let ciphertext = Cipher::encrypt(&key, &iv, b"data");

        assert_eq!(
            Cipher::decrypt(&key, &iv[..8], &ciphertext),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_key_from_bytes_length() {
        assert!(SymmetricKey::from_bytes(&[0u8; 32]).is_ok());
        assert_eq!(
            SymmetricKey::from_bytes(&[0u8; 16]),
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        );
    }

    #[test]
    fn test_large_plaintext() {
        let key = SymmetricKey::generate();
        let iv = Cipher::generate_iv();
        let plaintext = vec![0u8; 1_000_000];

        let ciphertext = Cipher::encrypt(&key, &iv, &plaintext);
        let decrypted = Cipher::decrypt(&key, &iv, &ciphertext).unwrap();

        assert_eq!(plaintext, decrypted);
    }
}
