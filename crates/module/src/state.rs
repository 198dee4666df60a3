//! On-chain state structures for the key-share module.
//!
//! The admission handler depends on the traits below rather than on the
//! concrete state, so the trusted set and the active key can be owned by
//! governance and DKG logic elsewhere in the runtime.

use condenc_types::{ActivePublicKey, Address, AggregatedConditionalKeyShare};
use std::collections::BTreeMap;

use crate::events::EventLog;
use crate::genesis::{GenesisValidationError, KeyShareGenesisConfig, SharePolicy};

/// Decides whether a submitter may publish key shares.
pub trait TrustGate {
    fn trusted_addresses(&self) -> &[String];

    /// Exact-match membership.
    fn is_trusted(&self, submitter: &str) -> bool {
        self.trusted_addresses()
            .iter()
            .any(|trusted| trusted == submitter)
    }
}

/// Exposes the network's current master public key.
pub trait ActiveKeyProvider {
    /// `None` until the DKG has provisioned a key.
    fn active_public_key(&self) -> Option<ActivePublicKey>;
}

/// Durable storage of admitted key shares, keyed by condition.
pub trait ShareStore {
    /// Upsert keyed by `share.condition`.
    fn put_aggregated_key_share(&mut self, share: AggregatedConditionalKeyShare);

    fn aggregated_key_share(&self, condition: &str) -> Option<AggregatedConditionalKeyShare>;

    /// Record a verified endorsement and return every creator that has
    /// endorsed `share.condition` so far.
    fn record_pending_share(&mut self, share: AggregatedConditionalKeyShare) -> Vec<Address>;

    fn clear_pending_shares(&mut self, condition: &str);
}

/// Ordered set of submitters allowed to publish key shares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedAddressSet {
    addresses: Vec<String>,
}

impl TrustedAddressSet {
    /// Build from a list, dropping repeated entries but keeping first-seen order.
    pub fn new(addresses: impl IntoIterator<Item = String>) -> Self {
        let mut set = Self::default();
        for address in addresses {
            if !set.addresses.contains(&address) {
                set.addresses.push(address);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl TrustGate for TrustedAddressSet {
    fn trusted_addresses(&self) -> &[String] {
        &self.addresses
    }
}

impl ActiveKeyProvider for Option<ActivePublicKey> {
    fn active_public_key(&self) -> Option<ActivePublicKey> {
        self.clone()
    }
}

/// Admitted shares plus endorsements waiting for a quorum.
#[derive(Debug, Default)]
pub struct ShareTable {
    /// condition -> committed share
    shares: BTreeMap<String, AggregatedConditionalKeyShare>,

    /// condition -> creator -> hex data
    pending: BTreeMap<String, BTreeMap<String, String>>,
}

impl ShareTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed shares ordered by condition.
    pub fn iter(&self) -> impl Iterator<Item = &AggregatedConditionalKeyShare> {
        self.shares.values()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Number of distinct creators endorsing a not yet committed condition.
    pub fn pending_count(&self, condition: &str) -> usize {
        self.pending.get(condition).map(|p| p.len()).unwrap_or(0)
    }

    /// Drop endorsements whose creator no longer passes `keep`.
    pub fn retain_pending_creators(&mut self, keep: impl Fn(&str) -> bool) {
        for endorsements in self.pending.values_mut() {
            endorsements.retain(|creator, _| keep(creator));
        }
        self.pending.retain(|_, endorsements| !endorsements.is_empty());
    }

    /// Drop every pending endorsement, returning how many conditions had some.
    pub fn clear_all_pending(&mut self) -> usize {
        let cleared = self.pending.len();
        self.pending.clear();
        cleared
    }
}

impl ShareStore for ShareTable {
    fn put_aggregated_key_share(&mut self, share: AggregatedConditionalKeyShare) {
        self.shares.insert(share.condition.clone(), share);
    }

    fn aggregated_key_share(&self, condition: &str) -> Option<AggregatedConditionalKeyShare> {
        self.shares.get(condition).cloned()
    }

    fn record_pending_share(&mut self, share: AggregatedConditionalKeyShare) -> Vec<Address> {
        let endorsements = self.pending.entry(share.condition).or_default();
        endorsements.insert(share.creator, share.data);
        endorsements.keys().cloned().collect()
    }

    fn clear_pending_shares(&mut self, condition: &str) {
        self.pending.remove(condition);
    }
}

/// Key-share module state.
///
/// In a real runtime these would be store-backed map/value types. This is
/// an in-memory representation with the same access pattern.
#[derive(Debug, Default)]
pub struct KeyShareState {
    /// Address allowed to rotate the key and edit the trusted set
    pub authority: Option<String>,

    /// Submitters allowed to publish key shares
    pub trusted: TrustedAddressSet,

    /// Current master public key
    pub active_key: Option<ActivePublicKey>,

    /// Admitted shares by condition
    pub shares: ShareTable,

    /// How verified shares become committed
    pub policy: SharePolicy,

    /// Events emitted by the current block's calls
    pub events: EventLog,
}

impl KeyShareState {
    /// Create an empty state with no trusted submitters and no active key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build initial state from a validated genesis config.
    pub fn from_genesis(config: &KeyShareGenesisConfig) -> Result<Self, GenesisValidationError> {
        config.validate()?;

        Ok(Self {
            authority: config.authority.clone(),
            trusted: TrustedAddressSet::new(config.trusted_addresses.iter().cloned()),
            active_key: config.active_public_key.clone(),
            shares: ShareTable::new(),
            policy: config.share_policy.clone(),
            events: EventLog::new(),
        })
    }

    /// Get the committed share for a condition.
    pub fn get_aggregated_key_share(
        &self,
        condition: &str,
    ) -> Option<&AggregatedConditionalKeyShare> {
        self.shares.shares.get(condition)
    }
}
