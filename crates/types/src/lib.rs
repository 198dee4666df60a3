//! Core type definitions for conditional key-share admission.
//!
//! This crate provides the shared data structures used across the workspace:
//! compressed curve points, IBE ciphertexts and the on-chain records kept by
//! the key-share module.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

// =========================
// CRYPTOGRAPHIC PRIMITIVES
// =========================

/// Compressed G1 point on BLS12-381 (48 bytes)
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct G1Point(#[serde_as(as = "[_; 48]")] pub [u8; 48]);

impl Default for G1Point {
    fn default() -> Self {
        Self([0u8; 48])
    }
}

/// Compressed G2 point on BLS12-381 (96 bytes)
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct G2Point(#[serde_as(as = "[_; 96]")] pub [u8; 96]);

impl Default for G2Point {
    fn default() -> Self {
        Self([0u8; 96])
    }
}

/// IBE ciphertext for a single condition.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct IbeCiphertext {
    /// Ephemeral public key: U = r·G1
    pub ephemeral_pubkey: G1Point,

    /// AES-256-GCM encrypted payload, key derived from the pairing
    pub ciphertext: Vec<u8>,

    /// Authentication tag
    pub tag: [u8; 16],

    /// Nonce for AEAD
    pub nonce: [u8; 12],
}

// =========================
// MODULE STATE RECORDS
// =========================

/// Account address of a submitter (bech32 or any other opaque string).
pub type Address = String;

/// The network's current master public key.
///
/// `public_key` is the hex encoding of a compressed G1 point.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ActivePublicKey {
    pub public_key: String,
}

/// A verified decryption key for one condition.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AggregatedConditionalKeyShare {
    /// Identity the key decrypts for; the storage key
    pub condition: String,
    /// Hex-encoded compressed G2 point
    pub data: String,
    /// Submitter, kept for provenance only
    pub creator: Address,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_g1_point_serialization() {
        let point = G1Point([42u8; 48]);
        let encoded = borsh::to_vec(&point).unwrap();
        let decoded: G1Point = borsh::from_slice(&encoded).unwrap();
        assert_eq!(point, decoded);
    }

    #[test]
    fn test_key_share_borsh_layout_is_stable() {
        let share = AggregatedConditionalKeyShare {
            condition: "42".to_string(),
            data: "ab".to_string(),
            creator: "alice".to_string(),
        };
        let encoded = borsh::to_vec(&share).unwrap();
        // u32 length prefix + bytes, field by field
        assert_eq!(&encoded[..6], &[2, 0, 0, 0, b'4', b'2']);
        let decoded: AggregatedConditionalKeyShare = borsh::from_slice(&encoded).unwrap();
        assert_eq!(decoded, share);
    }

    #[test]
    fn test_sha256_is_deterministic() {
        assert_eq!(sha256(b"condition"), sha256(b"condition"));
        assert_ne!(sha256(b"42"), sha256(b"43"));
    }
}
