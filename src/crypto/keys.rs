//! Party key registry
//!
//! Owns one RSA identity per party id and a directory of public keys, which
//! may also hold counterpart keys imported without their private half.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{CryptoError, CryptoResult};
use super::identity::{Identity, PublicKey, DEFAULT_KEY_BITS};

/// Public half of a registration, ready to hand to other parties
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredParty {
    /// Party id
    pub party: String,
    /// Base64 of the PEM `SubjectPublicKeyInfo`
    pub public_key: String,
}

/// Generates and owns per-party keypairs
pub struct KeyManager {
    key_bits: usize,
    identities: RwLock<HashMap<String, Arc<Identity>>>,
    public_keys: RwLock<HashMap<String, PublicKey>>,
}

impl KeyManager {
    /// Create an empty registry generating keys of the default size
    pub fn new() -> Self {
        Self::with_key_bits(DEFAULT_KEY_BITS)
    }

    /// Create an empty registry generating keys of `key_bits`
    pub fn with_key_bits(key_bits: usize) -> Self {
        KeyManager {
            key_bits,
            identities: RwLock::new(HashMap::new()),
            public_keys: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a standalone keypair without registering it
    pub fn generate_keypair(&self, bits: usize) -> CryptoResult<Identity> {
        Identity::generate(bits)
    }

    /// Register a party, generating a fresh keypair for it
    ///
    /// Registering an id that already exists replaces its keypair. Anything
    /// signed under the old key will no longer verify against this registry.
    pub fn register_party(&self, party: &str) -> CryptoResult<RegisteredParty> {
        let identity = Identity::generate(self.key_bits)?;
        let public_key = identity.public_key().clone();
        let encoded = public_key.to_transport()?;

        let replaced = self
            .identities
            .write()
            .insert(party.to_string(), Arc::new(identity))
            .is_some();
        self.public_keys.write().insert(party.to_string(), public_key.clone());

        if replaced {
            warn!(party, "replaced existing keypair; earlier signatures are orphaned");
        }
        info!(party, fingerprint = %public_key.fingerprint(), "party registered");

        Ok(RegisteredParty {
            party: party.to_string(),
            public_key: encoded,
        })
    }

    /// Get a party's identity (private key holder)
    pub fn get_private(&self, party: &str) -> CryptoResult<Arc<Identity>> {
        self.identities
            .read()
            .get(party)
            .cloned()
            .ok_or_else(|| CryptoError::UnknownParty(party.to_string()))
    }

    /// Get a party's public key
    pub fn get_public(&self, party: &str) -> CryptoResult<PublicKey> {
        self.public_keys
            .read()
            .get(party)
            .cloned()
            .ok_or_else(|| CryptoError::UnknownParty(party.to_string()))
    }

    /// Install a counterpart's public key from its transport encoding
    pub fn import_public(&self, party: &str, encoded: &str) -> CryptoResult<()> {
        let public_key = PublicKey::from_transport(encoded)?;
        debug!(party, fingerprint = %public_key.fingerprint(), "public key imported");
        self.public_keys.write().insert(party.to_string(), public_key);
        Ok(())
    }

    /// Whether a party holds a private key in this registry
    pub fn is_registered(&self, party: &str) -> bool {
        self.identities.read().contains_key(party)
    }

    /// Ids of every party with a known public key, sorted
    pub fn party_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.public_keys.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let km = KeyManager::new();
        let registered = km.register_party("alice").unwrap();

        assert_eq!(registered.party, "alice");
        assert!(km.is_registered("alice"));

        let private = km.get_private("alice").unwrap();
        let public = km.get_public("alice").unwrap();
        assert_eq!(private.public_key(), &public);

        // The exported encoding is the same key
        assert_eq!(PublicKey::from_transport(&registered.public_key).unwrap(), public);
    }

    #[test]
    fn test_unknown_party() {
        let km = KeyManager::new();

        assert_eq!(
            km.get_private("ghost").unwrap_err(),
            CryptoError::UnknownParty("ghost".into())
        );
        assert_eq!(
            km.get_public("ghost").unwrap_err(),
            CryptoError::UnknownParty("ghost".into())
        );
    }

    #[test]
    fn test_import_public_without_private() {
        let source = KeyManager::new();
        let exported = source.register_party("bob").unwrap();

        let km = KeyManager::new();
        km.import_public("bob", &exported.public_key).unwrap();

        assert_eq!(km.get_public("bob").unwrap(), source.get_public("bob").unwrap());
        assert!(!km.is_registered("bob"));
        assert!(matches!(km.get_private("bob"), Err(CryptoError::UnknownParty(_))));
        assert_eq!(km.party_ids(), vec!["bob".to_string()]);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let km = KeyManager::new();
        assert!(km.import_public("bob", "bm90IGEga2V5").is_err());
    }

    #[test]
    fn test_reregistration_orphans_signatures() {
        let km = KeyManager::new();
        km.register_party("carol").unwrap();

        let old = km.get_private("carol").unwrap();
        let signature = old.sign(b"terms").unwrap();

        km.register_party("carol").unwrap();
        let new_public = km.get_public("carol").unwrap();

        assert_ne!(old.public_key(), &new_public);
        assert!(new_public.verify(b"terms", &signature).is_err());
    }
}
