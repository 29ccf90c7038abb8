//! Document signing and verification
//!
//! This module provides contract signatures with:
//! - A signed descriptor binding document hash, signer and timestamp
//! - Canonical serialization of the descriptor for deterministic payloads
//! - Randomized RSA-PSS signatures (repeat signings differ, all verify)
//! - Tamper detection on the document hash before any signature math
//!
//! # Example
//!
//! ```rust,no_run
//! use conveyance::contract::{DigitalSignature, SignerInfo};
//! use conveyance::Identity;
//!
//! let signer = Identity::generate(2048).unwrap();
//! let info = SignerInfo::new("Alice", "buyer", "UK");
//!
//! let signed = DigitalSignature::sign_document("I agree.", &signer, info).unwrap();
//! assert!(DigitalSignature::verify_signature(&signed, signer.public_key()).is_ok());
//! ```

pub mod template;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{
    canonical_bytes, CryptoError, CryptoResult, Hash, Identity, PublicKey, SignatureBytes,
};

pub use template::{ContractDetails, ContractManager, PartyDetails, PropertyDetails};

/// Algorithm recorded in every signature descriptor
pub const SIGNATURE_ALGORITHM: &str = "RSA-PSS with SHA-256";

/// Intent recorded for contract signatures
pub const CONTRACT_INTENT: &str = "Legal agreement acceptance";

/// Statement attached to contract signatures
pub const LEGAL_STATEMENT: &str = "This digital signature constitutes a legally binding agreement \
under UK Electronic Communications Act 2000 and Electronic Signatures Regulations 2002.";

/// Who signed, and in what capacity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignerInfo {
    /// Signer's name
    pub name: String,
    /// Role in the transaction (buyer, seller, solicitor)
    pub role: String,
    /// Jurisdiction the signature is made under
    pub jurisdiction: String,
    /// Declared intent, for contract signatures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl SignerInfo {
    /// Create signer info without an intent
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        jurisdiction: impl Into<String>,
    ) -> Self {
        SignerInfo {
            name: name.into(),
            role: role.into(),
            jurisdiction: jurisdiction.into(),
            intent: None,
        }
    }

    /// Attach a declared intent
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }
}

/// The signed part of a document signature
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDescriptor {
    /// Hex SHA-256 of the document text
    pub document_hash: String,
    /// Who signed
    pub signer: SignerInfo,
    /// When they signed
    pub timestamp: DateTime<Utc>,
    /// Always [`SIGNATURE_ALGORITHM`]
    pub algorithm: String,
}

/// A document with its signature; never mutated by verification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedDocument {
    /// The document text
    pub document: String,
    /// Hash, signer and timestamp
    pub descriptor: SignatureDescriptor,
    /// RSA-PSS signature over the descriptor's canonical bytes
    pub signature: SignatureBytes,
    /// Legal-binding statement, present on contract signatures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_statement: Option<String>,
}

/// Summary of a signature, without the signature bytes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDetails {
    /// Who signed
    pub signer: SignerInfo,
    /// When they signed
    pub timestamp: DateTime<Utc>,
    /// Signature algorithm
    pub algorithm: String,
    /// Hex SHA-256 of the signed document
    pub document_hash: String,
}

impl From<&SignedDocument> for SignatureDetails {
    fn from(signed: &SignedDocument) -> Self {
        SignatureDetails {
            signer: signed.descriptor.signer.clone(),
            timestamp: signed.descriptor.timestamp,
            algorithm: signed.descriptor.algorithm.clone(),
            document_hash: signed.descriptor.document_hash.clone(),
        }
    }
}

/// Outcome of verifying a contract signature
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractVerification {
    /// Hash and signature both checked out
    pub is_valid: bool,
    /// Human-readable verdict
    pub message: String,
    /// Who signed
    pub signer: SignerInfo,
    /// When they signed
    pub timestamp: DateTime<Utc>,
    /// Signature algorithm
    pub algorithm: String,
    /// Valid, and made under a recognised jurisdiction
    pub legal_validity: bool,
    #[serde(skip)]
    failure: Option<CryptoError>,
}

impl ContractVerification {
    /// The verification outcome as a result
    pub fn outcome(&self) -> CryptoResult<()> {
        match &self.failure {
            None if self.is_valid => Ok(()),
            None => Err(CryptoError::SignatureVerificationFailed),
            Some(err) => Err(err.clone()),
        }
    }
}

/// Decides which jurisdictions give a signature legal validity
#[derive(Clone)]
pub struct JurisdictionPolicy {
    name: String,
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl JurisdictionPolicy {
    /// A named policy backed by an arbitrary predicate
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        JurisdictionPolicy {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Recognises any jurisdiction string naming the UK
    pub fn uk() -> Self {
        Self::new("UK", |jurisdiction| jurisdiction.contains("UK"))
    }

    /// Whether `jurisdiction` is recognised
    pub fn recognises(&self, jurisdiction: &str) -> bool {
        (self.predicate)(jurisdiction)
    }

    /// Policy name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for JurisdictionPolicy {
    fn default() -> Self {
        Self::uk()
    }
}

impl std::fmt::Debug for JurisdictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JurisdictionPolicy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Signs and verifies documents and contracts
#[derive(Clone, Debug)]
pub struct DigitalSignature {
    jurisdiction: String,
    policy: JurisdictionPolicy,
}

impl DigitalSignature {
    /// Contract signatures made under, and validated for, the UK
    pub fn new() -> Self {
        Self::with_policy("UK", JurisdictionPolicy::uk())
    }

    /// Contract signatures made under `jurisdiction`, validated by `policy`
    pub fn with_policy(jurisdiction: impl Into<String>, policy: JurisdictionPolicy) -> Self {
        DigitalSignature {
            jurisdiction: jurisdiction.into(),
            policy,
        }
    }

    /// Sign `document`, binding its hash to `signer_info` and the current time
    pub fn sign_document(
        document: &str,
        signer: &Identity,
        signer_info: SignerInfo,
    ) -> CryptoResult<SignedDocument> {
        let descriptor = SignatureDescriptor {
            document_hash: Hash::hash_hex(document.as_bytes()),
            signer: signer_info,
            timestamp: Utc::now(),
            algorithm: SIGNATURE_ALGORITHM.to_string(),
        };
        let signature = signer.sign(&canonical_bytes(&descriptor)?)?;

        Ok(SignedDocument {
            document: document.to_string(),
            descriptor,
            signature,
            legal_statement: None,
        })
    }

    /// Verify a signed document against the signer's public key
    ///
    /// The document hash is checked first; a mismatch is reported as
    /// `TamperDetected` without touching the signature.
    pub fn verify_signature(signed: &SignedDocument, signer_public: &PublicKey) -> CryptoResult<()> {
        if !Hash::verify_hex(signed.document.as_bytes(), &signed.descriptor.document_hash) {
            return Err(CryptoError::TamperDetected);
        }

        let payload = canonical_bytes(&signed.descriptor)?;
        signer_public.verify(&payload, &signed.signature)
    }

    /// Sign a contract as `name` in `role`, with intent and legal statement
    pub fn create_contract_signature(
        &self,
        contract: &str,
        name: &str,
        role: &str,
        signer: &Identity,
    ) -> CryptoResult<SignedDocument> {
        let info = SignerInfo::new(name, role, self.jurisdiction.as_str()).with_intent(CONTRACT_INTENT);

        let mut signed = Self::sign_document(contract, signer, info)?;
        signed.legal_statement = Some(LEGAL_STATEMENT.to_string());
        debug!(signer = name, role, "contract signed");
        Ok(signed)
    }

    /// Verify a contract signature and report the details
    pub fn verify_contract_signature(
        &self,
        signed: &SignedDocument,
        signer_public: &PublicKey,
    ) -> ContractVerification {
        let result = Self::verify_signature(signed, signer_public);
        let is_valid = result.is_ok();
        let message = match &result {
            Ok(()) => String::from("Signature verified successfully"),
            Err(err) => err.to_string(),
        };

        ContractVerification {
            is_valid,
            message,
            signer: signed.descriptor.signer.clone(),
            timestamp: signed.descriptor.timestamp,
            algorithm: signed.descriptor.algorithm.clone(),
            legal_validity: is_valid && self.policy.recognises(&signed.descriptor.signer.jurisdiction),
            failure: result.err(),
        }
    }
}

impl Default for DigitalSignature {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::identity::tests::fixtures;

    fn info() -> SignerInfo {
        SignerInfo::new("Test Signer", "test_role", "UK")
    }

    #[test]
    fn test_sign_and_verify() {
        let (alice, _) = fixtures();
        let document = "This is a test legal document for signature verification.";

        let signed = DigitalSignature::sign_document(document, alice, info()).unwrap();

        assert_eq!(signed.document, document);
        assert_eq!(signed.descriptor.algorithm, SIGNATURE_ALGORITHM);
        assert_eq!(signed.descriptor.document_hash, Hash::hash_hex(document.as_bytes()));
        assert!(signed.legal_statement.is_none());
        assert!(DigitalSignature::verify_signature(&signed, alice.public_key()).is_ok());
    }

    #[test]
    fn test_repeat_signing_differs() {
        let (alice, _) = fixtures();

        let s1 = DigitalSignature::sign_document("doc", alice, info()).unwrap();
        let s2 = DigitalSignature::sign_document("doc", alice, info()).unwrap();

        assert_ne!(s1.signature, s2.signature);
        assert!(DigitalSignature::verify_signature(&s1, alice.public_key()).is_ok());
        assert!(DigitalSignature::verify_signature(&s2, alice.public_key()).is_ok());
    }

    #[test]
    fn test_tampered_document_detected() {
        let (alice, _) = fixtures();

        let mut signed = DigitalSignature::sign_document("Original", alice, info()).unwrap();
        signed.document = "Tampered".into();

        assert_eq!(
            DigitalSignature::verify_signature(&signed, alice.public_key()),
            Err(CryptoError::TamperDetected)
        );
    }

    #[test]
    fn test_tamper_reported_before_signature_check() {
        let (alice, bob) = fixtures();

        let mut signed = DigitalSignature::sign_document("Original", alice, info()).unwrap();
        signed.document = "Tampered".into();
        signed.signature = SignatureBytes::from_bytes(b"junk");

        // Wrong key and junk signature, but the hash check fires first
        assert_eq!(
            DigitalSignature::verify_signature(&signed, bob.public_key()),
            Err(CryptoError::TamperDetected)
        );
    }

    #[test]
    fn test_wrong_signer_key() {
        let (alice, bob) = fixtures();

        let signed = DigitalSignature::sign_document("doc", alice, info()).unwrap();
        assert_eq!(
            DigitalSignature::verify_signature(&signed, bob.public_key()),
            Err(CryptoError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_altered_signer_info_fails() {
        let (alice, _) = fixtures();

        let mut signed = DigitalSignature::sign_document("doc", alice, info()).unwrap();
        signed.descriptor.signer.role = "seller".into();

        assert_eq!(
            DigitalSignature::verify_signature(&signed, alice.public_key()),
            Err(CryptoError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_contract_signature() {
        let (alice, _) = fixtures();
        let ds = DigitalSignature::new();

        let signed = ds
            .create_contract_signature("Purchase agreement", "Test Buyer", "buyer", alice)
            .unwrap();

        assert!(signed
            .legal_statement
            .as_deref()
            .unwrap()
            .contains("UK Electronic Communications Act"));
        assert_eq!(signed.descriptor.signer.intent.as_deref(), Some(CONTRACT_INTENT));

        let verification = ds.verify_contract_signature(&signed, alice.public_key());
        assert!(verification.is_valid);
        assert!(verification.legal_validity);
        assert_eq!(verification.signer.name, "Test Buyer");
        assert!(verification.outcome().is_ok());
    }

    #[test]
    fn test_legal_validity_gated_on_jurisdiction() {
        let (alice, _) = fixtures();
        let ds = DigitalSignature::with_policy("FR", JurisdictionPolicy::uk());

        let signed = ds.create_contract_signature("Contrat", "Acheteur", "buyer", alice).unwrap();
        let verification = ds.verify_contract_signature(&signed, alice.public_key());

        assert!(verification.is_valid);
        assert!(!verification.legal_validity);
    }

    #[test]
    fn test_custom_jurisdiction_predicate() {
        let (alice, _) = fixtures();
        let policy = JurisdictionPolicy::new("EU", |j| ["FR", "DE", "IE"].contains(&j));
        let ds = DigitalSignature::with_policy("IE", policy);

        let signed = ds.create_contract_signature("Contract", "Buyer", "buyer", alice).unwrap();
        assert!(ds.verify_contract_signature(&signed, alice.public_key()).legal_validity);
    }

    #[test]
    fn test_failed_contract_verification_reports_reason() {
        let (alice, _) = fixtures();
        let ds = DigitalSignature::new();

        let mut signed = ds.create_contract_signature("Contract", "Buyer", "buyer", alice).unwrap();
        signed.document.push_str(" amended");

        let verification = ds.verify_contract_signature(&signed, alice.public_key());
        assert!(!verification.is_valid);
        assert!(!verification.legal_validity);
        assert!(verification.message.contains("tampered"));
        assert_eq!(verification.outcome(), Err(CryptoError::TamperDetected));
    }

    #[test]
    fn test_signed_document_json_shape() {
        let (alice, _) = fixtures();
        let ds = DigitalSignature::new();
        let signed = ds.create_contract_signature("Contract", "Buyer", "buyer", alice).unwrap();

        let value = serde_json::to_value(&signed).unwrap();
        assert!(value["descriptor"]["documentHash"].is_string());
        assert_eq!(value["descriptor"]["signer"]["role"], "buyer");
        assert!(value["legalStatement"].is_string());

        let restored: SignedDocument = serde_json::from_value(value).unwrap();
        assert!(DigitalSignature::verify_signature(&restored, alice.public_key()).is_ok());
    }

    #[test]
    fn test_signature_details() {
        let (alice, _) = fixtures();
        let signed = DigitalSignature::sign_document("doc", alice, info()).unwrap();

        let details = SignatureDetails::from(&signed);
        assert_eq!(details.signer, signed.descriptor.signer);
        assert_eq!(details.document_hash, signed.descriptor.document_hash);
    }
}
