//! Genesis configuration for the key-share module.
//!
//! This module defines the initial state and configuration for key-share
//! admission when the chain starts.

use condenc_crypto::IbeParams;
use condenc_types::ActivePublicKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How verified shares turn into committed keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePolicy {
    /// Every verified share upserts the entry for its condition.
    #[default]
    Overwrite,

    /// Verified shares are held as endorsements until `threshold` distinct
    /// creators have submitted for the condition, then committed.
    AccumulateUntilThreshold { threshold: usize },
}

/// Genesis configuration for the key-share module.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeyShareGenesisConfig {
    /// Address allowed to rotate the active key and edit the trusted set
    #[serde(default)]
    pub authority: Option<String>,

    /// Submitters allowed to publish key shares
    pub trusted_addresses: Vec<String>,

    /// Optional master public key (usually set by the DKG after genesis)
    #[serde(default)]
    pub active_public_key: Option<ActivePublicKey>,

    #[serde(default)]
    pub share_policy: SharePolicy,
}

impl KeyShareGenesisConfig {
    /// Parse and validate a JSON genesis document.
    pub fn from_json_str(json: &str) -> Result<Self, GenesisValidationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GenesisValidationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        let mut seen = HashSet::new();
        for address in &self.trusted_addresses {
            if address.is_empty() {
                return Err(GenesisValidationError::EmptyTrustedAddress);
            }
            if !seen.insert(address.as_str()) {
                return Err(GenesisValidationError::DuplicateTrustedAddress(
                    address.clone(),
                ));
            }
        }

        if let Some(key) = &self.active_public_key {
            IbeParams::from_hex(&key.public_key)
                .map_err(|e| GenesisValidationError::InvalidMasterKey(e.to_string()))?;
        }

        if let SharePolicy::AccumulateUntilThreshold { threshold } = self.share_policy {
            if threshold == 0 {
                return Err(GenesisValidationError::InvalidThreshold(
                    "Threshold cannot be zero".into(),
                ));
            }
            if threshold > self.trusted_addresses.len() {
                return Err(GenesisValidationError::InvalidThreshold(
                    "Threshold cannot exceed trusted addresses".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Failed to parse genesis config: {0}")]
    Parse(String),

    #[error("Trusted address cannot be empty")]
    EmptyTrustedAddress,

    #[error("Duplicate trusted address: {0}")]
    DuplicateTrustedAddress(String),

    #[error("Invalid threshold configuration: {0}")]
    InvalidThreshold(String),

    #[error("Invalid master public key: {0}")]
    InvalidMasterKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KeyShareGenesisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.share_policy, SharePolicy::Overwrite);
    }

    #[test]
    fn test_duplicate_trusted_address() {
        let config = KeyShareGenesisConfig {
            trusted_addresses: vec!["alice".into(), "alice".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::DuplicateTrustedAddress(addr)) if addr == "alice"
        ));
    }

    #[test]
    fn test_empty_trusted_address() {
        let config = KeyShareGenesisConfig {
            trusted_addresses: vec!["".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::EmptyTrustedAddress)
        ));
    }

    #[test]
    fn test_invalid_master_key() {
        let config = KeyShareGenesisConfig {
            active_public_key: Some(ActivePublicKey {
                public_key: "abc".into(),
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidMasterKey(_))
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let mut config = KeyShareGenesisConfig {
            trusted_addresses: vec!["alice".into(), "bob".into()],
            share_policy: SharePolicy::AccumulateUntilThreshold { threshold: 0 },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidThreshold(_))
        ));

        config.share_policy = SharePolicy::AccumulateUntilThreshold { threshold: 3 };
        assert!(matches!(
            config.validate(),
            Err(GenesisValidationError::InvalidThreshold(_))
        ));

        config.share_policy = SharePolicy::AccumulateUntilThreshold { threshold: 2 };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "authority": "gov",
            "trusted_addresses": ["alice", "bob"],
            "share_policy": { "accumulate_until_threshold": { "threshold": 2 } }
        }"#;
        let config = KeyShareGenesisConfig::from_json_str(json).unwrap();

        assert_eq!(config.authority.as_deref(), Some("gov"));
        assert!(config.active_public_key.is_none());
        assert_eq!(
            config.share_policy,
            SharePolicy::AccumulateUntilThreshold { threshold: 2 }
        );

        let minimal = KeyShareGenesisConfig::from_json_str(r#"{"trusted_addresses": []}"#).unwrap();
        assert_eq!(minimal.share_policy, SharePolicy::Overwrite);

        assert!(matches!(
            KeyShareGenesisConfig::from_json_str("{"),
            Err(GenesisValidationError::Parse(_))
        ));
    }
}
