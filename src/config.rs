//! Protocol configuration
//!
//! Loaded from TOML. Every field is optional; missing fields take the
//! defaults below.
//!
//! ```toml
//! key_bits = 3072
//! hub_id = "hub"
//! seller_id = "seller"
//! buyer_id = "buyer"
//! buyer_name = "Mrs. Harvey"
//! jurisdiction = "UK"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::crypto::identity::MIN_KEY_BITS;
use crate::crypto::DEFAULT_KEY_BITS;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was being read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Not valid TOML, or wrong field types
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Could not be written back out as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parsed but semantically invalid
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Party ids and crypto parameters for one orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// RSA modulus size for every registered identity
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,

    /// Id of the relaying hub
    #[serde(default = "default_hub_id")]
    pub hub_id: String,

    /// Id of the seller's solicitor
    #[serde(default = "default_seller_id")]
    pub seller_id: String,

    /// Id of the buyer
    #[serde(default = "default_buyer_id")]
    pub buyer_id: String,

    /// Name the buyer signs under
    #[serde(default = "default_buyer_name")]
    pub buyer_name: String,

    /// Jurisdiction recorded on contract signatures
    #[serde(default = "default_jurisdiction")]
    pub jurisdiction: String,
}

fn default_key_bits() -> usize {
    DEFAULT_KEY_BITS
}

fn default_hub_id() -> String {
    "hub".to_string()
}

fn default_seller_id() -> String {
    "seller".to_string()
}

fn default_buyer_id() -> String {
    "buyer".to_string()
}

fn default_buyer_name() -> String {
    "Buyer".to_string()
}

fn default_jurisdiction() -> String {
    "UK".to_string()
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            key_bits: default_key_bits(),
            hub_id: default_hub_id(),
            seller_id: default_seller_id(),
            buyer_id: default_buyer_id(),
            buyer_name: default_buyer_name(),
            jurisdiction: default_jurisdiction(),
        }
    }
}

impl ProtocolConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check key size and party ids
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_bits < MIN_KEY_BITS {
            return Err(ConfigError::Invalid(format!(
                "key_bits must be at least {MIN_KEY_BITS}, got {}",
                self.key_bits
            )));
        }

        let ids = [
            ("hub_id", &self.hub_id),
            ("seller_id", &self.seller_id),
            ("buyer_id", &self.buyer_id),
        ];
        for (field, id) in ids {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} cannot be empty")));
            }
        }
        if self.hub_id == self.seller_id
            || self.hub_id == self.buyer_id
            || self.seller_id == self.buyer_id
        {
            return Err(ConfigError::Invalid(
                "hub_id, seller_id and buyer_id must be distinct".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ProtocolConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.key_bits, 2048);
        assert_eq!(config.jurisdiction, "UK");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ProtocolConfig::from_toml_str("buyer_name = \"Mrs. Harvey\"").unwrap();
        assert_eq!(config.buyer_name, "Mrs. Harvey");
        assert_eq!(config.hub_id, "hub");
        assert_eq!(config.key_bits, DEFAULT_KEY_BITS);
    }

    #[test]
    fn test_rejects_small_keys() {
        let err = ProtocolConfig::from_toml_str("key_bits = 1024").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = ProtocolConfig::from_toml_str("seller_id = \"hub\"").unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_rejects_empty_id() {
        let err = ProtocolConfig::from_toml_str("buyer_id = \" \"").unwrap_err();
        assert!(err.to_string().contains("buyer_id"));
    }

    #[test]
    fn test_rejects_bad_toml() {
        assert!(matches!(
            ProtocolConfig::from_toml_str("key_bits = \"big\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ProtocolConfig {
            buyer_name: "Mrs. Harvey".into(),
            ..ProtocolConfig::default()
        };
        assert_eq!(ProtocolConfig::from_toml_str(&config.to_toml().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_to_toml_writes_every_field() {
        let text = ProtocolConfig::default().to_toml().unwrap();
        for field in ["key_bits", "hub_id", "seller_id", "buyer_id", "buyer_name", "jurisdiction"] {
            assert!(text.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProtocolConfig::load("/nonexistent/conveyance.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
