//! Query handlers for the key-share module.
//!
//! These functions provide read-only access to key-share state.

use crate::state::{KeyShareState, TrustGate};
use condenc_types::{ActivePublicKey, AggregatedConditionalKeyShare};
use serde::{Deserialize, Serialize};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum KeyShareQuery {
    /// Get the committed key for a condition.
    GetAggregatedKeyShare { condition: String },

    /// Get committed keys ordered by condition (paginated).
    ListAggregatedKeyShares { offset: u64, limit: u64 },

    /// Get the active master public key.
    GetActivePubKey,

    /// Check whether an address may submit key shares.
    IsTrusted { address: String },

    /// Get the trusted submitter set.
    ListTrustedAddresses,

    /// Get how many creators have endorsed a not yet committed condition.
    GetPendingShareCount { condition: String },
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyShareQueryResponse {
    AggregatedKeyShare(Option<AggregatedConditionalKeyShare>),

    AggregatedKeyShareList(Vec<AggregatedConditionalKeyShare>),

    ActivePubKey(Option<ActivePublicKey>),

    Trusted(bool),

    TrustedAddresses(Vec<String>),

    PendingShareCount(usize),
}

/// Handle a query.
pub fn handle_query(state: &KeyShareState, query: KeyShareQuery) -> KeyShareQueryResponse {
    match query {
        KeyShareQuery::GetAggregatedKeyShare { condition } => {
            KeyShareQueryResponse::AggregatedKeyShare(
                state.get_aggregated_key_share(&condition).cloned(),
            )
        }

        KeyShareQuery::ListAggregatedKeyShares { offset, limit } => {
            let shares = state
                .shares
                .iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .cloned()
                .collect();
            KeyShareQueryResponse::AggregatedKeyShareList(shares)
        }

        KeyShareQuery::GetActivePubKey => KeyShareQueryResponse::ActivePubKey(state.active_key.clone()),

        KeyShareQuery::IsTrusted { address } => {
            KeyShareQueryResponse::Trusted(state.trusted.is_trusted(&address))
        }

        KeyShareQuery::ListTrustedAddresses => {
            KeyShareQueryResponse::TrustedAddresses(state.trusted.trusted_addresses().to_vec())
        }

        KeyShareQuery::GetPendingShareCount { condition } => {
            KeyShareQueryResponse::PendingShareCount(state.shares.pending_count(&condition))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ShareStore, TrustedAddressSet};

    fn state_with_shares(conditions: &[&str]) -> KeyShareState {
        let mut state = KeyShareState::new();
        for condition in conditions {
            state.shares.put_aggregated_key_share(AggregatedConditionalKeyShare {
                condition: condition.to_string(),
                data: "aa".into(),
                creator: "alice".into(),
            });
        }
        state
    }

    #[test]
    fn test_get_active_pub_key_none() {
        let state = KeyShareState::new();
        let response = handle_query(&state, KeyShareQuery::GetActivePubKey);
        assert_eq!(response, KeyShareQueryResponse::ActivePubKey(None));
    }

    #[test]
    fn test_get_aggregated_key_share() {
        let state = state_with_shares(&["42"]);

        let found = handle_query(
            &state,
            KeyShareQuery::GetAggregatedKeyShare {
                condition: "42".into(),
            },
        );
        assert!(matches!(
            found,
            KeyShareQueryResponse::AggregatedKeyShare(Some(share)) if share.creator == "alice"
        ));

        let missing = handle_query(
            &state,
            KeyShareQuery::GetAggregatedKeyShare {
                condition: "43".into(),
            },
        );
        assert_eq!(missing, KeyShareQueryResponse::AggregatedKeyShare(None));
    }

    #[test]
    fn test_list_is_paginated_by_condition() {
        let state = state_with_shares(&["c", "a", "b"]);

        let response = handle_query(
            &state,
            KeyShareQuery::ListAggregatedKeyShares {
                offset: 1,
                limit: 5,
            },
        );
        match response {
            KeyShareQueryResponse::AggregatedKeyShareList(shares) => {
                let conditions: Vec<_> = shares.iter().map(|s| s.condition.as_str()).collect();
                assert_eq!(conditions, vec!["b", "c"]);
            }
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_list_with_out_of_range_bounds() {
        let state = state_with_shares(&["a", "b"]);

        let all = handle_query(
            &state,
            KeyShareQuery::ListAggregatedKeyShares {
                offset: 0,
                limit: u64::MAX,
            },
        );
        assert!(matches!(
            all,
            KeyShareQueryResponse::AggregatedKeyShareList(shares) if shares.len() == 2
        ));

        let none = handle_query(
            &state,
            KeyShareQuery::ListAggregatedKeyShares {
                offset: u64::MAX,
                limit: 10,
            },
        );
        assert_eq!(none, KeyShareQueryResponse::AggregatedKeyShareList(vec![]));
    }

    #[test]
    fn test_is_trusted_query() {
        let mut state = KeyShareState::new();
        state.trusted = TrustedAddressSet::new(vec!["alice".to_string()]);

        let response = handle_query(
            &state,
            KeyShareQuery::IsTrusted {
                address: "alice".into(),
            },
        );
        assert_eq!(response, KeyShareQueryResponse::Trusted(true));

        let response = handle_query(&state, KeyShareQuery::ListTrustedAddresses);
        assert_eq!(
            response,
            KeyShareQueryResponse::TrustedAddresses(vec!["alice".into()])
        );
    }
}
