//! Server Agents
//!
//! A `ServerAgent` binds one owned reservoir to shared encoder and policy
//! handles and carries the set of patterns the fleet has confirmed as normal
//! for its role. The set grows monotonically for the agent's lifetime and is
//! never consulted by `evaluate`; it exists for fleet-visible audit state.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::encoder::SpikeEncoder;
use crate::error::Result;
use crate::event::{ConfigChangeEvent, ServerRole};
use crate::policy::{PolicyEngine, Verdict};
use crate::reservoir::{Reservoir, ReservoirConfig};

/// Per-event output of an agent: the verdict plus the identifiers the fleet
/// layer needs for propagation and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub agent_id: String,
    pub role: ServerRole,
    pub pattern_tag: String,
    pub verdict: Verdict,
}

/// A single server in the fleet.
#[derive(Debug, Clone)]
pub struct ServerAgent {
    id: String,
    role: ServerRole,
    reservoir: Reservoir,
    encoder: Arc<SpikeEncoder>,
    policy: Arc<PolicyEngine>,
    learned_patterns: BTreeSet<String>,
}

impl ServerAgent {
    /// Agent with default components and thread-RNG reservoir weights.
    pub fn new(id: impl Into<String>, role: ServerRole) -> Result<Self> {
        let reservoir = Reservoir::new(ReservoirConfig::default())?;
        Ok(Self::with_components(
            id,
            role,
            reservoir,
            Arc::new(SpikeEncoder::default()),
            Arc::new(PolicyEngine::new()),
        ))
    }

    /// Agent with a seeded reservoir, for reproducible pipelines.
    pub fn with_seed(id: impl Into<String>, role: ServerRole, seed: u64) -> Result<Self> {
        let reservoir = Reservoir::with_seed(ReservoirConfig::default(), seed)?;
        Ok(Self::with_components(
            id,
            role,
            reservoir,
            Arc::new(SpikeEncoder::default()),
            Arc::new(PolicyEngine::new()),
        ))
    }

    /// Full-control constructor; lets a fleet share one encoder and one
    /// policy table across all agents.
    pub fn with_components(
        id: impl Into<String>,
        role: ServerRole,
        reservoir: Reservoir,
        encoder: Arc<SpikeEncoder>,
        policy: Arc<PolicyEngine>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            reservoir,
            encoder,
            policy,
            learned_patterns: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> ServerRole {
        self.role
    }

    /// Patterns the fleet has shared with this agent as normal for its role.
    pub fn learned_patterns(&self) -> &BTreeSet<String> {
        &self.learned_patterns
    }

    pub fn has_learned(&self, pattern_tag: &str) -> bool {
        self.learned_patterns.contains(pattern_tag)
    }

    /// Evaluate one event: validate, encode, drive the reservoir, apply
    /// policy, in that order. `&mut self` serializes all evaluations on one
    /// agent. The learned-pattern set plays no part here.
    pub fn evaluate(&mut self, event: &ConfigChangeEvent) -> Result<Evaluation> {
        event.validate()?;

        let feature = self.encoder.encode(event, self.role);
        log::debug!(
            "[{}] encoded {} as `{}` (intensity {})",
            self.id,
            event.category,
            feature.pattern_tag,
            feature.intensity
        );

        let state = self.reservoir.process(&feature);
        let verdict = self.policy.evaluate(&feature, &state);
        log::debug!(
            "[{}] {} ({:.1}% confidence): {}",
            self.id,
            verdict.decision,
            verdict.confidence,
            verdict.reason
        );

        Ok(Evaluation {
            agent_id: self.id.clone(),
            role: self.role,
            pattern_tag: feature.pattern_tag,
            verdict,
        })
    }

    /// Record a fleet-approved pattern as normal for this agent's role.
    /// Idempotent set insert; returns whether the tag was new. Audit-only:
    /// future evaluations do not branch on it.
    pub fn learn(&mut self, pattern_tag: &str) -> bool {
        let newly_learned = self.learned_patterns.insert(pattern_tag.to_string());
        if newly_learned {
            log::info!(
                "[{}] learned `{}` as normal for {} servers",
                self.id,
                pattern_tag,
                self.role
            );
        }
        newly_learned
    }
}
