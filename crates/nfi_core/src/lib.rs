//! Neuromorphic Fleet Intelligence Core
//!
//! Evaluates configuration-change events against per-server policy. Each
//! event is encoded as a spike feature, driven through a fixed random
//! recurrent reservoir (a minimal liquid state machine), and mapped to a
//! categorical verdict with a confidence score. A fleet coordinator routes
//! events to server agents and shares approved patterns with peers of the
//! same role.
//!
//! Pipeline per event:
//! [`SpikeEncoder::encode`] -> [`Reservoir::process`] ->
//! [`PolicyEngine::evaluate`] -> [`FleetCoordinator`] propagation.
//!
//! Reservoir weights are frozen at construction. "Learning" here means
//! appending a pattern tag to an agent's set, never weight adaptation.
//! Reservoir state accumulates history, so evaluating the same event twice
//! on one agent may yield different confidence scores; that is intended
//! behavior, not drift to be corrected.

pub mod agent;
pub mod encoder;
pub mod error;
pub mod event;
pub mod fleet;
pub mod policy;
pub mod reservoir;

pub use agent::{Evaluation, ServerAgent};
pub use encoder::{EncodingRule, SpikeEncoder, SpikeFeature, SpikeTemplate};
pub use error::{FleetError, Result};
pub use event::{ConfigChangeEvent, ServerRole};
pub use fleet::{FleetCoordinator, FleetKnowledge, FleetOutcome, ReviewFlag};
pub use policy::{Decision, PolicyEngine, Verdict};
pub use reservoir::{Reservoir, ReservoirConfig, StateVector};
