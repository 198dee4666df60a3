//! Call message types for the key-share module.

use borsh::{BorshDeserialize, BorshSerialize};

/// Call messages for the key-share module.
///
/// The submitter is the transaction sender carried in
/// [`CallContext`](crate::handlers::CallContext).
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum KeyShareCall {
    /// Submit the decryption key for a condition (trusted addresses only).
    CreateAggregatedConditionalKeyShare {
        condition: String,
        /// Hex-encoded compressed G2 point
        data: String,
    },

    // === Admin ===
    /// Rotate the active master public key (authority only, stands in for DKG).
    SetActivePublicKey { public_key: String },

    /// Replace the trusted submitter set (authority only).
    UpdateTrustedAddresses { addresses: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_borsh_roundtrip() {
        let call = KeyShareCall::CreateAggregatedConditionalKeyShare {
            condition: "42".into(),
            data: "abcd".into(),
        };
        let encoded = borsh::to_vec(&call).unwrap();
        // enum discriminant comes first
        assert_eq!(encoded[0], 0);
        let decoded: KeyShareCall = borsh::from_slice(&encoded).unwrap();
        assert_eq!(decoded, call);
    }
}
