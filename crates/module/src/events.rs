//! Audit events emitted by the key-share module.
//!
//! Events are observability only; they are never part of consensus state.

use serde::{Deserialize, Serialize};

/// Event type for rejected submissions.
pub const KEY_SHARE_VERIFICATION_TYPE: &str = "keyshare-verification";
/// Event type for committed keys.
pub const AGGREGATED_KEY_SHARE_ADDED_TYPE: &str = "aggregated-key-share-added";
/// Event type for endorsements recorded below the accumulate threshold.
pub const PENDING_KEY_SHARE_RECORDED_TYPE: &str = "pending-key-share-recorded";

pub const ATTRIBUTE_CREATOR: &str = "creator";
pub const ATTRIBUTE_CONDITION: &str = "condition";
pub const ATTRIBUTE_REASON: &str = "reason";
pub const ATTRIBUTE_PENDING: &str = "pending";
pub const ATTRIBUTE_THRESHOLD: &str = "threshold";

/// Emitted on every rejected submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFailureEvent {
    pub creator: String,
    pub condition: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyShareEvent {
    VerificationFailed(VerificationFailureEvent),

    AggregatedKeyShareAdded {
        creator: String,
        condition: String,
    },

    PendingKeyShareRecorded {
        creator: String,
        condition: String,
        pending: usize,
        threshold: usize,
    },
}

impl KeyShareEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            KeyShareEvent::VerificationFailed(_) => KEY_SHARE_VERIFICATION_TYPE,
            KeyShareEvent::AggregatedKeyShareAdded { .. } => AGGREGATED_KEY_SHARE_ADDED_TYPE,
            KeyShareEvent::PendingKeyShareRecorded { .. } => PENDING_KEY_SHARE_RECORDED_TYPE,
        }
    }

    /// Flat key/value attributes, in emission order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        match self {
            KeyShareEvent::VerificationFailed(event) => vec![
                (ATTRIBUTE_CREATOR, event.creator.clone()),
                (ATTRIBUTE_CONDITION, event.condition.clone()),
                (ATTRIBUTE_REASON, event.reason.clone()),
            ],
            KeyShareEvent::AggregatedKeyShareAdded { creator, condition } => vec![
                (ATTRIBUTE_CREATOR, creator.clone()),
                (ATTRIBUTE_CONDITION, condition.clone()),
            ],
            KeyShareEvent::PendingKeyShareRecorded {
                creator,
                condition,
                pending,
                threshold,
            } => vec![
                (ATTRIBUTE_CREATOR, creator.clone()),
                (ATTRIBUTE_CONDITION, condition.clone()),
                (ATTRIBUTE_PENDING, pending.to_string()),
                (ATTRIBUTE_THRESHOLD, threshold.to_string()),
            ],
        }
    }
}

/// Sink for module events.
///
/// Emission is fire and forget: an emitter that cannot record an event must
/// not fail the request that produced it.
pub trait AuditEmitter {
    fn emit(&mut self, event: KeyShareEvent);
}

/// In-memory event log, drained by the runtime after each call.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<KeyShareEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[KeyShareEvent] {
        &self.events
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain(&mut self) -> Vec<KeyShareEvent> {
        std::mem::take(&mut self.events)
    }

    /// Verification failures recorded so far.
    pub fn verification_failures(&self) -> impl Iterator<Item = &VerificationFailureEvent> {
        self.events.iter().filter_map(|event| match event {
            KeyShareEvent::VerificationFailed(failure) => Some(failure),
            _ => None,
        })
    }
}

impl AuditEmitter for EventLog {
    fn emit(&mut self, event: KeyShareEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_event_attributes() {
        let event = KeyShareEvent::VerificationFailed(VerificationFailureEvent {
            creator: "alice".into(),
            condition: "42".into(),
            reason: "decrypted data does not match original data".into(),
        });

        assert_eq!(event.event_type(), KEY_SHARE_VERIFICATION_TYPE);
        assert_eq!(
            event.attributes(),
            vec![
                ("creator", "alice".to_string()),
                ("condition", "42".to_string()),
                ("reason", "decrypted data does not match original data".to_string()),
            ]
        );
    }

    #[test]
    fn test_event_log_drain() {
        let mut log = EventLog::new();
        log.emit(KeyShareEvent::AggregatedKeyShareAdded {
            creator: "alice".into(),
            condition: "42".into(),
        });
        log.emit(KeyShareEvent::VerificationFailed(VerificationFailureEvent {
            creator: "bob".into(),
            condition: "43".into(),
            reason: "active key not found".into(),
        }));

        assert_eq!(log.verification_failures().count(), 1);
        assert_eq!(log.drain().len(), 2);
        assert!(log.events().is_empty());
    }
}
