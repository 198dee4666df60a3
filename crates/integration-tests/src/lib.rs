//! End-to-end integration tests for conditional key-share admission.
//!
//! These tests exercise the full flow:
//! 1. Master key setup (stand-in for the DKG)
//! 2. Encryption of user data to a condition
//! 3. Key release and on-chain admission
//! 4. Decryption of user data with the admitted key

#![cfg(test)]

use condenc_crypto::ibe::{extract, g1_to_hex, g2_from_hex, g2_to_hex, master_public_key};
use condenc_crypto::{decrypt, encrypt, IbeParams};
use condenc_module::handlers::handle_call;
use condenc_module::queries::handle_query;
use condenc_module::{
    CallContext, KeyShareCall, KeyShareError, KeyShareEvent, KeyShareGenesisConfig,
    KeyShareQuery, KeyShareQueryResponse, KeyShareState, SharePolicy, VerificationFailure,
};
use condenc_types::{ActivePublicKey, AggregatedConditionalKeyShare};

use bls12_381::Scalar;
use ff::Field;
use rand::rngs::OsRng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_test_writer()
        .try_init();
}

fn ctx(sender: &str, block_height: u64) -> CallContext {
    CallContext {
        sender: sender.to_string(),
        block_height,
    }
}

fn submit(condition: &str, data: &str) -> KeyShareCall {
    KeyShareCall::CreateAggregatedConditionalKeyShare {
        condition: condition.to_string(),
        data: data.to_string(),
    }
}

fn genesis_with_key(master_secret: &Scalar) -> KeyShareGenesisConfig {
    KeyShareGenesisConfig {
        authority: Some("gov".into()),
        trusted_addresses: vec!["alice".into(), "bob".into(), "carol".into()],
        active_public_key: Some(ActivePublicKey {
            public_key: g1_to_hex(&master_public_key(master_secret)),
        }),
        share_policy: SharePolicy::Overwrite,
    }
}

/// Trusted alice submits SK_42 for "42", then the same data for "43".
#[test]
fn test_end_to_end_admission() {
    init_tracing();

    // ========================================
    // Phase 1: Setup
    // ========================================

    let master_secret = Scalar::random(&mut OsRng);
    let genesis = genesis_with_key(&master_secret);
    let mut state = KeyShareState::from_genesis(&genesis).unwrap();

    // ========================================
    // Phase 2: A user encrypts to condition "42"
    // ========================================

    let params = IbeParams::from_hex(&genesis.active_public_key.as_ref().unwrap().public_key)
        .unwrap();
    let user_ciphertext = encrypt(&params, b"42", b"unlock at height 42", &mut OsRng).unwrap();

    // ========================================
    // Phase 3: Key release and admission
    // ========================================

    let sk_42 = g2_to_hex(&extract(&master_secret, b"42"));

    handle_call(&mut state, &ctx("alice", 42), submit("42", &sk_42)).unwrap();

    let response = handle_query(
        &state,
        KeyShareQuery::GetAggregatedKeyShare {
            condition: "42".into(),
        },
    );
    assert_eq!(
        response,
        KeyShareQueryResponse::AggregatedKeyShare(Some(AggregatedConditionalKeyShare {
            condition: "42".into(),
            data: sk_42.clone(),
            creator: "alice".into(),
        }))
    );

    // Same key claimed for another condition
    let result = handle_call(&mut state, &ctx("alice", 43), submit("43", &sk_42));
    assert!(matches!(
        result,
        Err(KeyShareError::VerificationFailed(_))
    ));
    assert!(state.get_aggregated_key_share("43").is_none());

    // ========================================
    // Phase 4: Downstream decryption with the admitted key
    // ========================================

    let admitted = state.get_aggregated_key_share("42").unwrap();
    let key = g2_from_hex(&admitted.data).unwrap();
    let plaintext = decrypt(&params, &key, &user_ciphertext).unwrap();
    assert_eq!(plaintext, b"unlock at height 42");

    let events = state.events.drain();
    assert!(matches!(
        events.as_slice(),
        [
            KeyShareEvent::AggregatedKeyShareAdded { .. },
            KeyShareEvent::VerificationFailed(failure),
        ] if failure.condition == "43" && failure.creator == "alice"
    ));
}

#[test]
fn test_untrusted_submitter_never_writes() {
    init_tracing();

    let master_secret = Scalar::random(&mut OsRng);
    let mut state = KeyShareState::from_genesis(&genesis_with_key(&master_secret)).unwrap();
    let sk_7 = g2_to_hex(&extract(&master_secret, b"7"));

    for data in [sk_7.as_str(), "", "0", "not hex at all"] {
        let result = handle_call(&mut state, &ctx("mallory", 1), submit("7", data));
        assert_eq!(result, Err(KeyShareError::Unauthorized("mallory".into())));
    }

    assert!(state.shares.is_empty());
    assert_eq!(state.events.verification_failures().count(), 4);
}

#[test]
fn test_no_active_key_until_provisioned() {
    init_tracing();

    let master_secret = Scalar::random(&mut OsRng);
    let mut genesis = genesis_with_key(&master_secret);
    let mpk_hex = genesis.active_public_key.take().unwrap().public_key;
    let mut state = KeyShareState::from_genesis(&genesis).unwrap();

    let sk = g2_to_hex(&extract(&master_secret, b"epoch-3"));

    let err = handle_call(&mut state, &ctx("bob", 5), submit("epoch-3", &sk)).unwrap_err();
    assert_eq!(err, KeyShareError::NoActiveKey);
    assert!(err.is_transient());

    // The DKG (governance stand-in) provisions the key; the same request now passes
    handle_call(
        &mut state,
        &ctx("gov", 6),
        KeyShareCall::SetActivePublicKey {
            public_key: mpk_hex,
        },
    )
    .unwrap();
    handle_call(&mut state, &ctx("bob", 7), submit("epoch-3", &sk)).unwrap();

    assert_eq!(state.get_aggregated_key_share("epoch-3").unwrap().creator, "bob");
}

#[test]
fn test_malformed_inputs_are_rejected_cleanly() {
    init_tracing();

    let master_secret = Scalar::random(&mut OsRng);
    let mut state = KeyShareState::from_genesis(&genesis_with_key(&master_secret)).unwrap();
    let sk = g2_to_hex(&extract(&master_secret, b"99"));

    let odd = &sk[1..];
    let bad_chars = sk.replacen(&sk[..2], "gg", 1);
    for data in [odd, bad_chars.as_str(), "", "00"] {
        let err = handle_call(&mut state, &ctx("carol", 1), submit("99", data)).unwrap_err();
        assert!(
            matches!(err, KeyShareError::MalformedInput { .. }),
            "unexpected {:?}",
            err
        );
        assert!(!err.is_transient());
    }

    // A corrupted active key is also an input error, not a panic
    state.active_key = Some(ActivePublicKey {
        public_key: "abc".into(),
    });
    let err = handle_call(&mut state, &ctx("carol", 2), submit("99", &sk)).unwrap_err();
    assert!(matches!(err, KeyShareError::MalformedInput { .. }));

    assert!(state.shares.is_empty());
    assert_eq!(state.events.verification_failures().count(), 5);
}

#[test]
fn test_rotated_master_key_invalidates_old_shares() {
    init_tracing();

    let old_secret = Scalar::random(&mut OsRng);
    let new_secret = Scalar::random(&mut OsRng);
    let mut state = KeyShareState::from_genesis(&genesis_with_key(&old_secret)).unwrap();

    handle_call(
        &mut state,
        &ctx("gov", 10),
        KeyShareCall::SetActivePublicKey {
            public_key: g1_to_hex(&master_public_key(&new_secret)),
        },
    )
    .unwrap();

    let stale = g2_to_hex(&extract(&old_secret, b"100"));
    let err = handle_call(&mut state, &ctx("alice", 11), submit("100", &stale)).unwrap_err();
    assert!(matches!(
        err,
        KeyShareError::VerificationFailed(VerificationFailure::DecryptError(_))
    ));

    let fresh = g2_to_hex(&extract(&new_secret, b"100"));
    handle_call(&mut state, &ctx("alice", 12), submit("100", &fresh)).unwrap();
}

#[test]
fn test_resubmission_is_idempotent() {
    init_tracing();

    let master_secret = Scalar::random(&mut OsRng);
    let mut state = KeyShareState::from_genesis(&genesis_with_key(&master_secret)).unwrap();
    let sk = g2_to_hex(&extract(&master_secret, b"42"));

    handle_call(&mut state, &ctx("alice", 1), submit("42", &sk)).unwrap();
    let first = state.get_aggregated_key_share("42").cloned();
    handle_call(&mut state, &ctx("alice", 2), submit("42", &sk)).unwrap();

    assert_eq!(state.get_aggregated_key_share("42").cloned(), first);
    assert_eq!(state.shares.len(), 1);
}

#[test]
fn test_accumulate_policy_from_json_genesis() {
    init_tracing();

    let master_secret = Scalar::random(&mut OsRng);
    let json = serde_json::json!({
        "trusted_addresses": ["alice", "bob", "carol"],
        "active_public_key": { "public_key": g1_to_hex(&master_public_key(&master_secret)) },
        "share_policy": { "accumulate_until_threshold": { "threshold": 2 } }
    })
    .to_string();

    let genesis = KeyShareGenesisConfig::from_json_str(&json).unwrap();
    let mut state = KeyShareState::from_genesis(&genesis).unwrap();
    let sk = g2_to_hex(&extract(&master_secret, b"vote-closed"));

    handle_call(&mut state, &ctx("alice", 1), submit("vote-closed", &sk)).unwrap();
    assert_eq!(
        handle_query(
            &state,
            KeyShareQuery::GetPendingShareCount {
                condition: "vote-closed".into(),
            },
        ),
        KeyShareQueryResponse::PendingShareCount(1)
    );
    assert!(state.get_aggregated_key_share("vote-closed").is_none());

    handle_call(&mut state, &ctx("carol", 2), submit("vote-closed", &sk)).unwrap();
    let committed = state.get_aggregated_key_share("vote-closed").unwrap();
    assert_eq!(committed.creator, "carol");
    assert_eq!(committed.data, sk);
}

#[test]
fn test_call_wire_encoding() {
    let call = submit("42", "abcd");
    let encoded = borsh::to_vec(&call).unwrap();
    let decoded: KeyShareCall = borsh::from_slice(&encoded).unwrap();
    assert_eq!(decoded, call);
}
