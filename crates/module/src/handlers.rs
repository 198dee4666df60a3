//! Call handlers for the key-share module.
//!
//! Admission of a condition key runs
//! `Received → Authorized → KeyFetched → Verified → Committed`, with a
//! rejection branch at every step. All checks happen before any write, and
//! every rejection emits exactly one `keyshare-verification` event.

use condenc_crypto::{g2_from_hex, verify_key_share, IbeParams};
use condenc_types::{ActivePublicKey, Address, AggregatedConditionalKeyShare};
use tracing::{debug, error, info, warn};

use crate::call::KeyShareCall;
use crate::error::{InputField, KeyShareError};
use crate::events::{AuditEmitter, KeyShareEvent, VerificationFailureEvent};
use crate::genesis::SharePolicy;
use crate::state::{ActiveKeyProvider, KeyShareState, ShareStore, TrustGate, TrustedAddressSet};

/// Context provided by the runtime for each call.
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, KeyShareError>;

/// Dispatch a call against the in-memory module state.
pub fn handle_call(
    state: &mut KeyShareState,
    ctx: &CallContext,
    call: KeyShareCall,
) -> HandlerResult<()> {
    match call {
        KeyShareCall::CreateAggregatedConditionalKeyShare { condition, data } => {
            let KeyShareState {
                trusted,
                active_key,
                shares,
                policy,
                events,
                ..
            } = state;
            handle_create_aggregated_key_share(
                &*trusted,
                &*active_key,
                shares,
                events,
                &*policy,
                ctx,
                condition,
                data,
            )
        }
        KeyShareCall::SetActivePublicKey { public_key } => {
            handle_set_active_public_key(state, ctx, public_key)
        }
        KeyShareCall::UpdateTrustedAddresses { addresses } => {
            handle_update_trusted_addresses(state, ctx, addresses)
        }
    }
}

/// Handle CreateAggregatedConditionalKeyShare call.
///
/// The store is written only after the share passes verification. On any
/// rejection a failure event carrying the reason is emitted before the error
/// is returned.
#[allow(clippy::too_many_arguments)]
pub fn handle_create_aggregated_key_share<T, K, S, E>(
    trust: &T,
    keys: &K,
    store: &mut S,
    events: &mut E,
    policy: &SharePolicy,
    ctx: &CallContext,
    condition: String,
    data: String,
) -> HandlerResult<()>
where
    T: TrustGate,
    K: ActiveKeyProvider,
    S: ShareStore,
    E: AuditEmitter,
{
    if let Err(err) = verify_submission(trust, keys, &ctx.sender, &condition, &data) {
        reject(events, &ctx.sender, &condition, &err);
        return Err(err);
    }

    let share = AggregatedConditionalKeyShare {
        condition,
        data,
        creator: ctx.sender.clone(),
    };

    match policy {
        SharePolicy::Overwrite => commit(store, events, ctx, share),
        SharePolicy::AccumulateUntilThreshold { threshold } => {
            if store.aggregated_key_share(&share.condition).is_some() {
                commit(store, events, ctx, share);
                return Ok(());
            }

            let condition = share.condition.clone();
            // Creators removed from the trusted set since endorsing no longer count
            let pending = store
                .record_pending_share(share.clone())
                .iter()
                .filter(|creator| trust.is_trusted(creator))
                .count();
            if pending >= *threshold {
                store.clear_pending_shares(&condition);
                commit(store, events, ctx, share);
            } else {
                debug!(
                    condition = %condition,
                    creator = %ctx.sender,
                    pending,
                    threshold,
                    "Recorded pending key share"
                );
                events.emit(KeyShareEvent::PendingKeyShareRecorded {
                    creator: ctx.sender.clone(),
                    condition,
                    pending,
                    threshold: *threshold,
                });
            }
        }
    }

    Ok(())
}

/// Every check that gates admission. Performs no writes.
fn verify_submission<T, K>(
    trust: &T,
    keys: &K,
    creator: &str,
    condition: &str,
    data: &str,
) -> HandlerResult<()>
where
    T: TrustGate,
    K: ActiveKeyProvider,
{
    // Authorization happens before any cryptographic work
    if !trust.is_trusted(creator) {
        return Err(KeyShareError::Unauthorized(creator.to_string()));
    }

    let active_key = keys
        .active_public_key()
        .ok_or(KeyShareError::NoActiveKey)?;

    let params =
        IbeParams::from_hex(&active_key.public_key).map_err(|e| KeyShareError::MalformedInput {
            field: InputField::ActivePublicKey,
            reason: e.to_string(),
        })?;

    let key_share = g2_from_hex(data).map_err(|e| KeyShareError::MalformedInput {
        field: InputField::KeyShare,
        reason: e.to_string(),
    })?;

    // Encrypt a fixed canary to the condition and require the share to
    // decrypt it back exactly.
    verify_key_share(&params, condition.as_bytes(), &key_share)?;

    Ok(())
}

fn commit<S, E>(
    store: &mut S,
    events: &mut E,
    ctx: &CallContext,
    share: AggregatedConditionalKeyShare,
) where
    S: ShareStore,
    E: AuditEmitter,
{
    info!(
        condition = %share.condition,
        creator = %share.creator,
        height = ctx.block_height,
        "Aggregated key added"
    );
    events.emit(KeyShareEvent::AggregatedKeyShareAdded {
        creator: share.creator.clone(),
        condition: share.condition.clone(),
    });
    store.put_aggregated_key_share(share);
}

fn reject<E: AuditEmitter>(events: &mut E, creator: &str, condition: &str, err: &KeyShareError) {
    let reason = err.to_string();
    match err {
        KeyShareError::Unauthorized(_) | KeyShareError::NoActiveKey => {
            warn!(creator, condition, reason = %reason, "Rejected key share");
        }
        _ => {
            error!(creator, condition, reason = %reason, "Key share verification failed");
        }
    }

    events.emit(KeyShareEvent::VerificationFailed(VerificationFailureEvent {
        creator: creator.to_string(),
        condition: condition.to_string(),
        reason,
    }));
}

/// Handle SetActivePublicKey call.
pub fn handle_set_active_public_key(
    state: &mut KeyShareState,
    ctx: &CallContext,
    public_key: String,
) -> HandlerResult<()> {
    ensure_authority(state, ctx)?;

    IbeParams::from_hex(&public_key).map_err(|e| KeyShareError::MalformedInput {
        field: InputField::ActivePublicKey,
        reason: e.to_string(),
    })?;

    // Pending endorsements were verified under the previous key
    let cleared = state.shares.clear_all_pending();
    info!(
        height = ctx.block_height,
        cleared_pending = cleared,
        "Active public key rotated"
    );
    state.active_key = Some(ActivePublicKey { public_key });

    Ok(())
}

/// Handle UpdateTrustedAddresses call.
pub fn handle_update_trusted_addresses(
    state: &mut KeyShareState,
    ctx: &CallContext,
    addresses: Vec<String>,
) -> HandlerResult<()> {
    ensure_authority(state, ctx)?;

    let trusted = TrustedAddressSet::new(addresses.into_iter().filter(|a| !a.is_empty()));
    if let SharePolicy::AccumulateUntilThreshold { threshold } = state.policy {
        if trusted.len() < threshold {
            warn!(
                threshold,
                trusted = trusted.len(),
                "Rejected trusted set smaller than share threshold"
            );
            return Err(KeyShareError::ThresholdExceedsTrustedSet {
                threshold,
                trusted: trusted.len(),
            });
        }
    }

    state.trusted = trusted;
    state
        .shares
        .retain_pending_creators(|creator| state.trusted.is_trusted(creator));
    info!(
        trusted = state.trusted.len(),
        height = ctx.block_height,
        "Trusted addresses updated"
    );

    Ok(())
}

fn ensure_authority(state: &KeyShareState, ctx: &CallContext) -> HandlerResult<()> {
    if state.authority.as_deref() != Some(ctx.sender.as_str()) {
        warn!(sender = %ctx.sender, "Admin call from non-authority");
        return Err(KeyShareError::Unauthorized(ctx.sender.clone()));
    }
    Ok(())
}
