//! # Conveyance
//!
//! Three-party secure document exchange for property purchase contracts.
//!
//! ## Features
//!
//! - **Hybrid encryption**: AES-256-CBC payloads with RSA-OAEP wrapped keys
//! - **Authenticated messages**: signed SHA-256 descriptors catch tampering and impersonation
//! - **Contract signatures**: randomized RSA-PSS with tamper detection and jurisdiction checks
//! - **Relayed protocol**: every document crosses a trusted hub, with an audit trail
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use conveyance::{ContractDetails, ProtocolOrchestrator};
//!
//! let orchestrator = ProtocolOrchestrator::new();
//! orchestrator.initialize_parties().unwrap();
//! orchestrator.establish_channels(true).unwrap();
//!
//! let sent = orchestrator
//!     .initiate_contract_exchange(ContractDetails::with_price("500000", "C-1"))
//!     .unwrap();
//! let forwarded = orchestrator.hub_receive_and_forward(&sent.envelope).unwrap();
//! let signed = orchestrator.buyer_sign_contract(&forwarded.envelope).unwrap();
//! let delivered = orchestrator.hub_forward_signed(&signed.envelope).unwrap();
//!
//! assert!(delivered.contract_verified);
//! assert!(orchestrator.summary().state.is_complete());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              PROTOCOL LAYER                 │
//! │  Orchestrator | Milestones | Audit log      │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │           MESSAGING / CONTRACTS             │
//! │  Envelopes | Sessions | Integrity | Signing │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │               CRYPTO LAYER                  │
//! │  RSA-OAEP | RSA-PSS | AES-256-CBC | SHA-256 │
//! └─────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod contract;
pub mod crypto;
pub mod protocol;
pub mod session;

// Re-export main types at crate root
pub use config::{ConfigError, ProtocolConfig};
pub use contract::{ContractDetails, ContractManager, DigitalSignature, SignedDocument, SignerInfo};
pub use crypto::{
    random_bytes, CryptoError, CryptoResult, Identity, KeyManager, PublicKey, SignatureBytes,
};
pub use protocol::{ProtocolOrchestrator, ProtocolState, ProtocolSummary, Role};
pub use session::{Envelope, MessageIntegrity, SecureCommunication};
