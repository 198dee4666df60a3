//! Ledger module admitting conditional decryption keys.
//!
//! A committee of trusted nodes publishes, per condition, the IBE decryption
//! key SK_c. Before a key is written to state it must pass a self-contained
//! check: a fixed canary encrypted to `c` under the active master public key
//! must decrypt back exactly with the submitted key.
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Admission logic and admin calls
//! - `queries`: Read-only state access
//! - `state`: Collaborator traits and in-memory state
//! - `events`: Audit events and the event sink
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use condenc_module::{handlers, CallContext, KeyShareCall, KeyShareState};
//!
//! let mut state = KeyShareState::from_genesis(&genesis)?;
//! let ctx = CallContext { sender: "alice".into(), block_height: 42 };
//!
//! handlers::handle_call(
//!     &mut state,
//!     &ctx,
//!     KeyShareCall::CreateAggregatedConditionalKeyShare { condition, data },
//! )?;
//! ```

pub mod call;
pub mod error;
pub mod events;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;

pub use call::KeyShareCall;
pub use error::{InputField, KeyShareError, VerificationFailure};
pub use events::{AuditEmitter, EventLog, KeyShareEvent, VerificationFailureEvent};
pub use genesis::{GenesisValidationError, KeyShareGenesisConfig, SharePolicy};
pub use handlers::{CallContext, HandlerResult};
pub use queries::{KeyShareQuery, KeyShareQueryResponse};
pub use state::{ActiveKeyProvider, KeyShareState, ShareStore, TrustGate, TrustedAddressSet};
