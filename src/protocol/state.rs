//! Milestone flags and the audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How far the transaction has progressed
///
/// Flags only ever go from `false` to `true`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolState {
    /// Hub identity registered
    pub hub_registered: bool,
    /// Seller's solicitor identity registered
    pub seller_registered: bool,
    /// Buyer identity registered
    pub buyer_registered: bool,
    /// Session channels established
    pub keys_exchanged: bool,
    /// Contract sent by the seller's solicitor
    pub contract_sent: bool,
    /// Contract signed by the buyer
    pub contract_signed: bool,
    /// Signed contract delivered back to the seller's solicitor
    pub transaction_complete: bool,
}

impl ProtocolState {
    /// All three parties registered
    pub fn parties_registered(&self) -> bool {
        self.hub_registered && self.seller_registered && self.buyer_registered
    }

    /// Every milestone reached
    pub fn is_complete(&self) -> bool {
        self.parties_registered()
            && self.keys_exchanged
            && self.contract_sent
            && self.contract_signed
            && self.transaction_complete
    }
}

/// One audit-trail record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Acting party, or `SYSTEM`
    pub sender: String,
    /// Receiving party, or `ALL`
    pub recipient: String,
    /// What happened
    pub action: String,
    /// Short summary of the outcome
    pub detail: String,
}

/// Append-only, ordered audit trail
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry stamped with the current time
    pub fn record(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.entries.push(AuditEntry {
            timestamp: Utc::now(),
            sender: sender.into(),
            recipient: recipient.into(),
            action: action.into(),
            detail: detail.into(),
        });
    }

    /// Entries in recording order
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }
}
