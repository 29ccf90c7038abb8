//! Six-phase contract exchange between seller's solicitor, hub and buyer
//!
//! The seller's solicitor and the buyer never exchange envelopes directly.
//! Every document crosses the hub, which decrypts, verifies and re-encrypts
//! it for the next party. The hub is a trusted relay: it sees each document
//! in cleartext while forwarding it.
//!
//! ```text
//! 1. initialize_parties        register hub, seller, buyer
//! 2. establish_channels        session keys hub<->seller, hub<->buyer
//! 3. initiate_contract_exchange  seller --contract--> hub
//! 4. hub_receive_and_forward     hub --cover+contract--> buyer
//! 5. buyer_sign_contract         buyer --signed contract--> hub
//! 6. hub_forward_signed          hub --signed contract+verification--> seller
//! ```
//!
//! Each phase appends exactly one audit entry, whether it succeeds or not.
//! A failed phase records `FAILED: <action>` and leaves the milestone flags
//! untouched.

pub mod state;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ProtocolConfig;
use crate::contract::{
    ContractDetails, ContractManager, ContractVerification, DigitalSignature, JurisdictionPolicy,
    SignatureDetails, SignedDocument,
};
use crate::crypto::{
    AuthFailure, CryptoError, CryptoResult, Identity, KeyManager, PublicKey, RegisteredParty,
};
use crate::session::{
    AuthenticatedMessage, Envelope, MessageIntegrity, SecureCommunication, SessionId,
};

pub use state::{AuditEntry, AuditLog, ProtocolState};

/// Party roles in the exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Relaying intermediary
    Hub,
    /// Seller's solicitor, originator of the contract
    SellerSolicitor,
    /// Buyer, who signs the contract
    Buyer,
}

impl Role {
    /// Role name recorded on signatures
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Hub => "hub",
            Role::SellerSolicitor => "seller_solicitor",
            Role::Buyer => "buyer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six protocol phases, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// 1: register identities
    PartyInitialization,
    /// 2: establish session keys
    ChannelEstablishment,
    /// 3: seller sends contract to hub
    ContractExchange,
    /// 4: hub forwards contract to buyer
    ContractForwarding,
    /// 5: buyer signs and returns
    ContractSigning,
    /// 6: hub delivers signed contract to seller
    FinalDelivery,
}

impl Phase {
    /// Position in the protocol, starting at 1
    pub fn number(&self) -> u8 {
        match self {
            Phase::PartyInitialization => 1,
            Phase::ChannelEstablishment => 2,
            Phase::ContractExchange => 3,
            Phase::ContractForwarding => 4,
            Phase::ContractSigning => 5,
            Phase::FinalDelivery => 6,
        }
    }

    /// Audit-log action for a successful run
    pub fn action(&self) -> &'static str {
        match self {
            Phase::PartyInitialization => "Party initialization complete",
            Phase::ChannelEstablishment => "Secure channels established",
            Phase::ContractExchange => "Contract sent to hub",
            Phase::ContractForwarding => "Contract forwarded to buyer",
            Phase::ContractSigning => "Signed contract returned to hub",
            Phase::FinalDelivery => "Signed contract delivered to seller's solicitor",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "phase {} ({})", self.number(), self.action())
    }
}

/// Phase 1 result
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationOutcome {
    /// Always [`Phase::PartyInitialization`]
    pub phase: Phase,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Exported public keys, hub first
    pub parties: Vec<RegisteredParty>,
}

/// Whether a channel was set up as new or as a continuing relationship
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Full establishment for parties that have not spoken before
    FirstTime,
    /// Continuing relationship; key material is still regenerated
    Subsequent,
}

/// One established channel
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelReport {
    /// The two endpoints, initiator first
    pub parties: [String; 2],
    /// Canonical pair id
    pub session_id: SessionId,
    /// How the channel was requested
    pub channel_type: ChannelType,
    /// Always false: establishment never reuses cached keys
    pub reused_existing_key: bool,
    /// Fingerprint of the session key as wrapped for the peer
    pub wrapped_key_fingerprint: String,
}

/// Phase 2 result
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelOutcome {
    /// Always [`Phase::ChannelEstablishment`]
    pub phase: Phase,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Whether hub and seller were treated as new counterparts
    pub first_time: bool,
    /// Hub-seller channel, then hub-buyer channel
    pub channels: Vec<ChannelReport>,
}

/// Result of a phase that sends one envelope onward (phases 3 and 4)
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransmissionOutcome {
    /// Which phase produced this
    pub phase: Phase,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Contract reference
    pub contract_id: String,
    /// Sending party id
    pub sender: String,
    /// Receiving party id
    pub recipient: String,
    /// Party the content originated from, when relayed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_from: Option<String>,
    /// The sealed message
    pub envelope: Envelope,
}

/// Phase 5 result
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningOutcome {
    /// Always [`Phase::ContractSigning`]
    pub phase: Phase,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Buyer id
    pub sender: String,
    /// Hub id
    pub recipient: String,
    /// Always true on success
    pub contract_signed: bool,
    /// The buyer's signature, without signature bytes
    pub signature_details: SignatureDetails,
    /// Signed contract sealed for the hub
    pub envelope: Envelope,
}

/// Phase 6 result
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    /// Always [`Phase::FinalDelivery`]
    pub phase: Phase,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Hub id
    pub sender: String,
    /// Seller id
    pub recipient: String,
    /// Buyer's contract signature checked out
    pub contract_verified: bool,
    /// Full verification report for the buyer's signature
    pub verification: ContractVerification,
    /// Signed contract and report sealed for the seller
    pub envelope: Envelope,
}

/// Hub's message to the buyer
#[derive(Clone, Debug, Serialize, Deserialize)]
struct CoverMessage {
    message: String,
    contract: String,
    instructions: String,
}

/// Buyer's message back to the hub
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedReturn {
    signed_contract: SignedDocument,
    message: String,
    signer: String,
}

/// Hub's final message to the seller
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionMessage {
    signed_contract: SignedDocument,
    message: String,
    verification: ContractVerification,
}

/// Algorithms in use
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMeasures {
    /// Asymmetric and symmetric algorithms
    pub encryption_algorithms: Vec<String>,
    /// Digest functions
    pub hash_functions: Vec<String>,
    /// RSA modulus size
    pub rsa_key_size: String,
    /// AES key size
    pub aes_key_size: String,
    /// How parties and messages are authenticated
    pub authentication_methods: Vec<String>,
}

impl SecurityMeasures {
    fn for_key_bits(key_bits: usize) -> Self {
        let list = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        let mut encryption_algorithms =
            vec![format!("RSA-{key_bits} for key exchange and digital signatures")];
        encryption_algorithms.extend(list(&[
            "AES-256-CBC for symmetric encryption",
            "RSA-OAEP for hybrid encryption",
            "RSA-PSS for digital signatures",
        ]));
        SecurityMeasures {
            encryption_algorithms,
            hash_functions: list(&["SHA-256"]),
            rsa_key_size: format!("{key_bits} bits"),
            aes_key_size: String::from("256 bits"),
            authentication_methods: list(&[
                "Digital signatures with RSA-PSS",
                "Message authentication with hash verification",
                "Public key infrastructure for identity verification",
            ]),
        }
    }
}

/// Legal properties the signatures are made under
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegalCompliance {
    /// UK Electronic Communications Act 2000
    pub uk_electronic_communications_act: bool,
    /// Electronic Signatures Regulations 2002
    pub electronic_signatures_regulations: bool,
    /// Personal data is only visible to the parties and the hub
    pub data_protection_compliance: bool,
    /// Signatures bind the signer to the document
    pub non_repudiation: bool,
}

impl Default for LegalCompliance {
    fn default() -> Self {
        LegalCompliance {
            uk_electronic_communications_act: true,
            electronic_signatures_regulations: true,
            data_protection_compliance: true,
            non_repudiation: true,
        }
    }
}

/// Snapshot of an orchestrator
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolSummary {
    /// Milestone flags
    pub state: ProtocolState,
    /// Full audit trail
    pub log: AuditLog,
    /// Algorithms in use
    pub security_measures: SecurityMeasures,
    /// Legal properties
    pub legal_compliance: LegalCompliance,
    /// Details of the contract sent in phase 3, once sent
    pub transaction: Option<ContractDetails>,
}

#[derive(Debug, Default)]
struct Progress {
    state: ProtocolState,
    log: AuditLog,
    transaction: Option<ContractDetails>,
}

/// Drives the exchange and owns every party's keys
pub struct ProtocolOrchestrator {
    config: ProtocolConfig,
    keys: KeyManager,
    comm: SecureCommunication,
    signatures: DigitalSignature,
    progress: Mutex<Progress>,
}

impl ProtocolOrchestrator {
    /// Orchestrator with the default configuration
    pub fn new() -> Self {
        Self::with_config(ProtocolConfig::default())
    }

    /// Orchestrator for the given configuration
    pub fn with_config(config: ProtocolConfig) -> Self {
        let signatures =
            DigitalSignature::with_policy(config.jurisdiction.as_str(), JurisdictionPolicy::uk());
        Self::with_signatures(config, signatures)
    }

    /// Orchestrator with a custom signature policy
    pub fn with_signatures(config: ProtocolConfig, signatures: DigitalSignature) -> Self {
        ProtocolOrchestrator {
            keys: KeyManager::with_key_bits(config.key_bits),
            config,
            comm: SecureCommunication::new(),
            signatures,
            progress: Mutex::new(Progress::default()),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Key registry, for registering, fetching and importing keys
    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// Party id for a role
    pub fn party_id(&self, role: Role) -> &str {
        match role {
            Role::Hub => &self.config.hub_id,
            Role::SellerSolicitor => &self.config.seller_id,
            Role::Buyer => &self.config.buyer_id,
        }
    }

    /// Current milestone flags
    pub fn state(&self) -> ProtocolState {
        self.progress.lock().state
    }

    /// Phase 1: register hub, seller and buyer
    ///
    /// Calling this again regenerates every key, orphaning signatures made
    /// under the previous ones.
    pub fn initialize_parties(&self) -> CryptoResult<InitializationOutcome> {
        let phase = Phase::PartyInitialization;
        info!(%phase, "starting");

        let result = [Role::Hub, Role::SellerSolicitor, Role::Buyer]
            .into_iter()
            .map(|role| self.keys.register_party(self.party_id(role)))
            .collect::<CryptoResult<Vec<_>>>()
            .map(|parties| InitializationOutcome {
                phase,
                timestamp: Utc::now(),
                parties,
            });

        self.conclude(
            phase,
            "SYSTEM",
            "ALL",
            result,
            |outcome| format!("{} parties registered", outcome.parties.len()),
            |progress| {
                progress.state.hub_registered = true;
                progress.state.seller_registered = true;
                progress.state.buyer_registered = true;
            },
        )
    }

    /// Phase 2: establish hub-seller and hub-buyer session keys
    ///
    /// With `first_time == false` the hub-seller channel is requested as a
    /// continuing relationship, but fresh key material is generated anyway;
    /// nothing cached by an earlier call is reused. The hub-buyer channel is
    /// always established as new.
    pub fn establish_channels(&self, first_time: bool) -> CryptoResult<ChannelOutcome> {
        let phase = Phase::ChannelEstablishment;
        info!(%phase, first_time, "starting");

        let seller_type = if first_time {
            ChannelType::FirstTime
        } else {
            ChannelType::Subsequent
        };
        let result = (|| -> CryptoResult<ChannelOutcome> {
            // Every key is resolved before any session is cached
            let hub_id = self.party_id(Role::Hub);
            self.keys.get_private(hub_id)?;
            let seller_public = self.keys.get_public(self.party_id(Role::SellerSolicitor))?;
            let buyer_public = self.keys.get_public(self.party_id(Role::Buyer))?;

            let hub_seller =
                self.establish_channel(Role::SellerSolicitor, &seller_public, seller_type)?;
            let hub_buyer =
                self.establish_channel(Role::Buyer, &buyer_public, ChannelType::FirstTime)?;
            Ok(ChannelOutcome {
                phase,
                timestamp: Utc::now(),
                first_time,
                channels: vec![hub_seller, hub_buyer],
            })
        })();

        self.conclude(
            phase,
            "SYSTEM",
            "ALL",
            result,
            |outcome| format!("{} channels established", outcome.channels.len()),
            |progress| progress.state.keys_exchanged = true,
        )
    }

    /// Phase 3: seller renders the contract, authenticates it and seals it for the hub
    ///
    /// A missing contract id is replaced by a random UUID.
    pub fn initiate_contract_exchange(
        &self,
        mut details: ContractDetails,
    ) -> CryptoResult<TransmissionOutcome> {
        let phase = Phase::ContractExchange;
        let seller_id = self.party_id(Role::SellerSolicitor);
        let hub_id = self.party_id(Role::Hub);
        info!(%phase, "starting");

        if details.property.contract_id.is_empty() {
            details.property.contract_id = Uuid::new_v4().to_string();
        }

        let result = (|| -> CryptoResult<TransmissionOutcome> {
            let seller = self.keys.get_private(seller_id)?;
            let hub_public = self.keys.get_public(hub_id)?;

            let contract = ContractManager::render(&details, Utc::now().date_naive());
            let envelope = seal(&contract, &seller, seller_id, &hub_public, hub_id)?;

            Ok(TransmissionOutcome {
                phase,
                timestamp: Utc::now(),
                contract_id: details.property.contract_id.clone(),
                sender: seller_id.to_string(),
                recipient: hub_id.to_string(),
                received_from: None,
                envelope,
            })
        })();

        self.conclude(
            phase,
            seller_id,
            hub_id,
            result,
            |outcome| format!("contract {}", outcome.contract_id),
            |progress| {
                progress.state.contract_sent = true;
                progress.transaction = Some(details);
            },
        )
    }

    /// Phase 4: hub opens the seller's contract and forwards it to the buyer
    pub fn hub_receive_and_forward(&self, envelope: &Envelope) -> CryptoResult<TransmissionOutcome> {
        let phase = Phase::ContractForwarding;
        let hub_id = self.party_id(Role::Hub);
        let seller_id = self.party_id(Role::SellerSolicitor);
        let buyer_id = self.party_id(Role::Buyer);
        info!(%phase, "starting");

        let result = (|| -> CryptoResult<TransmissionOutcome> {
            let hub = self.keys.get_private(hub_id)?;
            let seller_public = self.keys.get_public(seller_id)?;
            let buyer_public = self.keys.get_public(buyer_id)?;

            // The hub holds the contract in cleartext from here on
            let contract = open(envelope, &hub, seller_id, &seller_public)?;
            let contract_id = ContractManager::contract_id(&contract)
                .unwrap_or_default()
                .to_string();
            debug!(contract_id = %contract_id, bytes = contract.len(), "hub verified seller contract");

            let cover = CoverMessage {
                message: String::from(
                    "Please review and digitally sign the attached property purchase contract.",
                ),
                contract,
                instructions: String::from(
                    "If you agree to the terms, please sign and return the contract.",
                ),
            };
            let sealed = seal(
                &serde_json::to_string(&cover)?,
                &hub,
                hub_id,
                &buyer_public,
                buyer_id,
            )?;

            Ok(TransmissionOutcome {
                phase,
                timestamp: Utc::now(),
                contract_id,
                sender: hub_id.to_string(),
                recipient: buyer_id.to_string(),
                received_from: Some(seller_id.to_string()),
                envelope: sealed,
            })
        })();

        self.conclude(
            phase,
            hub_id,
            buyer_id,
            result,
            |outcome| format!("contract {} relayed from {}", outcome.contract_id, seller_id),
            |_| {},
        )
    }

    /// Phase 5: buyer opens the hub's message, signs the contract and returns it
    pub fn buyer_sign_contract(&self, envelope: &Envelope) -> CryptoResult<SigningOutcome> {
        let phase = Phase::ContractSigning;
        let buyer_id = self.party_id(Role::Buyer);
        let hub_id = self.party_id(Role::Hub);
        info!(%phase, "starting");

        let result = (|| -> CryptoResult<SigningOutcome> {
            let buyer = self.keys.get_private(buyer_id)?;
            let hub_public = self.keys.get_public(hub_id)?;

            let cover: CoverMessage = parse(&open(envelope, &buyer, hub_id, &hub_public)?)?;
            let signed_contract = self.signatures.create_contract_signature(
                &cover.contract,
                &self.config.buyer_name,
                Role::Buyer.as_str(),
                &buyer,
            )?;
            let signature_details = SignatureDetails::from(&signed_contract);

            let reply = SignedReturn {
                signed_contract,
                message: String::from(
                    "I have reviewed and signed the contract. Please proceed with the transaction.",
                ),
                signer: self.config.buyer_name.clone(),
            };
            let sealed = seal(
                &serde_json::to_string(&reply)?,
                &buyer,
                buyer_id,
                &hub_public,
                hub_id,
            )?;

            Ok(SigningOutcome {
                phase,
                timestamp: Utc::now(),
                sender: buyer_id.to_string(),
                recipient: hub_id.to_string(),
                contract_signed: true,
                signature_details,
                envelope: sealed,
            })
        })();

        self.conclude(
            phase,
            buyer_id,
            hub_id,
            result,
            |outcome| format!("signed by {}", outcome.signature_details.signer.name),
            |progress| progress.state.contract_signed = true,
        )
    }

    /// Phase 6: hub verifies the buyer's signature and delivers to the seller
    pub fn hub_forward_signed(&self, envelope: &Envelope) -> CryptoResult<DeliveryOutcome> {
        let phase = Phase::FinalDelivery;
        let hub_id = self.party_id(Role::Hub);
        let buyer_id = self.party_id(Role::Buyer);
        let seller_id = self.party_id(Role::SellerSolicitor);
        info!(%phase, "starting");

        let result = (|| -> CryptoResult<DeliveryOutcome> {
            let hub = self.keys.get_private(hub_id)?;
            let buyer_public = self.keys.get_public(buyer_id)?;
            let seller_public = self.keys.get_public(seller_id)?;

            let reply: SignedReturn = parse(&open(envelope, &hub, buyer_id, &buyer_public)?)?;

            // The contract signature is checked separately from the message signature
            let verification = self
                .signatures
                .verify_contract_signature(&reply.signed_contract, &buyer_public);
            verification.outcome()?;

            let completion = CompletionMessage {
                signed_contract: reply.signed_contract,
                message: format!(
                    "{} has signed the contract. Transaction can proceed to completion.",
                    reply.signer
                ),
                verification: verification.clone(),
            };
            let sealed = seal(
                &serde_json::to_string(&completion)?,
                &hub,
                hub_id,
                &seller_public,
                seller_id,
            )?;

            Ok(DeliveryOutcome {
                phase,
                timestamp: Utc::now(),
                sender: hub_id.to_string(),
                recipient: seller_id.to_string(),
                contract_verified: verification.is_valid,
                verification,
                envelope: sealed,
            })
        })();

        self.conclude(
            phase,
            hub_id,
            seller_id,
            result,
            |outcome| {
                format!(
                    "signature by {} verified, legal validity {}",
                    outcome.verification.signer.name, outcome.verification.legal_validity
                )
            },
            |progress| progress.state.transaction_complete = true,
        )
    }

    /// Flags, audit trail and static metadata
    pub fn summary(&self) -> ProtocolSummary {
        let progress = self.progress.lock();
        ProtocolSummary {
            state: progress.state,
            log: progress.log.clone(),
            security_measures: SecurityMeasures::for_key_bits(self.config.key_bits),
            legal_compliance: LegalCompliance::default(),
            transaction: progress.transaction.clone(),
        }
    }

    fn establish_channel(
        &self,
        peer: Role,
        peer_public: &PublicKey,
        channel_type: ChannelType,
    ) -> CryptoResult<ChannelReport> {
        let hub_id = self.party_id(Role::Hub);
        let peer_id = self.party_id(peer);

        if channel_type == ChannelType::Subsequent {
            info!(peer = peer_id, "continuing relationship requested, regenerating session key");
        }
        let established = self.comm.establish_session_key(hub_id, peer_id, peer_public)?;

        Ok(ChannelReport {
            parties: [hub_id.to_string(), peer_id.to_string()],
            session_id: established.session_id,
            channel_type,
            reused_existing_key: false,
            wrapped_key_fingerprint: established.fingerprint,
        })
    }

    /// Append the phase's audit entry and, on success, advance the flags
    fn conclude<T>(
        &self,
        phase: Phase,
        sender: &str,
        recipient: &str,
        result: CryptoResult<T>,
        detail: impl FnOnce(&T) -> String,
        advance: impl FnOnce(&mut Progress),
    ) -> CryptoResult<T> {
        let mut progress = self.progress.lock();
        match &result {
            Ok(outcome) => {
                let detail = detail(outcome);
                advance(&mut progress);
                progress.log.record(sender, recipient, phase.action(), detail);
                info!(%phase, "complete");
            }
            Err(err) => {
                progress.log.record(
                    sender,
                    recipient,
                    format!("FAILED: {}", phase.action()),
                    err.to_string(),
                );
                warn!(%phase, error = %err, "failed");
            }
        }
        result
    }
}

impl Default for ProtocolOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Authenticate `text` as `sender_id` and seal it for the recipient
fn seal(
    text: &str,
    sender: &Identity,
    sender_id: &str,
    recipient_public: &PublicKey,
    recipient_id: &str,
) -> CryptoResult<Envelope> {
    let authenticated = MessageIntegrity::create_authenticated_message(text, sender_id, sender)?;
    SecureCommunication::encrypt(
        &serde_json::to_string(&authenticated)?,
        recipient_public,
        sender_id,
        recipient_id,
    )
}

/// Decrypt an envelope and verify it was authenticated by `sender_id`, returning the text
fn open(
    envelope: &Envelope,
    recipient: &Identity,
    sender_id: &str,
    sender_public: &PublicKey,
) -> CryptoResult<String> {
    let decrypted = SecureCommunication::decrypt(envelope, recipient)?;
    let message: AuthenticatedMessage = parse(&decrypted)?;
    let text = MessageIntegrity::verify_authenticated_message(&message, sender_public)?;

    if message.descriptor.sender_id != sender_id {
        return Err(CryptoError::AuthenticationFailed(AuthFailure::SenderMismatch));
    }
    Ok(text)
}

fn parse<T: DeserializeOwned>(text: &str) -> CryptoResult<T> {
    Ok(serde_json::from_str(text)?)
}
