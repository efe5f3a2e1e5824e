//! metaspn-contracts
//!
//! Concrete schema records shared across the metaspn pipeline stages:
//! - Signal/emission envelopes and causal trace metadata
//! - Social observation events
//! - Task and result records
//! - Recommendation and draft-message outputs
//! - State-machine configuration with legacy-alias normalization
//! - Season-1 chain account views with a payload dispatch registry
//!
//! Every record is an immutable value type implementing
//! [`SchemaRecord`](metaspn_core::record::SchemaRecord) against a static
//! shape table in `metaspn-core`. Canonicalization (sorted mapping keys,
//! UTC timestamps, construction-time sorted sets, privacy-mode omission)
//! is inherited from the engine.

pub mod envelope;
pub mod recommendations;
pub mod season1;
pub mod social;
pub mod state_machine;
pub mod tasks;

pub use crate::envelope::{
    EmissionEnvelope, EntityRef, SchemaVersionInfo, SignalEnvelope, TraceContext,
};
pub use crate::recommendations::{DraftMessage, Recommendation};
pub use crate::season1::{
    parse_season1_payload, validate_season1_payload, AttentionScoreUpdate, FounderStakeView,
    GameAccountView, PlayerAccountView, RewardClaim, RewardProjection, Season1Payload,
    SeasonAccountView, StakeAccountView,
};
pub use crate::social::{ProfileSnapshotSeen, SocialPostSeen};
pub use crate::state_machine::{
    normalize_state_machine_payload, parse_state_machine_config, validate_state_machine_config,
    validate_state_machine_payload, GateTransitionAttempt, StateMachineConfig,
    StateTransitionRule,
};
pub use crate::tasks::{Task, TaskResult};
