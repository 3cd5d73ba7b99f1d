//! Fleet Coordination
//!
//! The coordinator owns the agent registry outright: constructed once,
//! agents registered, then a pure request/response loop. Per event it
//! resolves the target agent, lets it evaluate, and applies the propagation
//! protocol keyed on the verdict: approved patterns are shared with every
//! other agent of the same role before the call returns; denied patterns are
//! recorded as confirmed violations; alerts are queued for human review.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::agent::{Evaluation, ServerAgent};
use crate::error::{FleetError, Result};
use crate::event::ConfigChangeEvent;
use crate::policy::Decision;

/// One alert awaiting external review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFlag {
    pub agent_id: String,
    pub pattern_tag: String,
    pub reason: String,
}

/// What the fleet has concluded so far. Observe-only: decision logic never
/// reads this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetKnowledge {
    /// Pattern tags confirmed as violations by a denied verdict.
    pub confirmed_violations: BTreeSet<String>,
    /// Alerts flagged for human review, in arrival order.
    pub review_queue: Vec<ReviewFlag>,
}

/// Per-event output of the coordinator: the agent's evaluation plus the ids
/// of peers that received the pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetOutcome {
    pub evaluation: Evaluation,
    pub propagated_to: Vec<String>,
}

/// Routes events to their target agent and coordinates fleet learning.
#[derive(Debug, Default)]
pub struct FleetCoordinator {
    agents: BTreeMap<String, ServerAgent>,
    knowledge: FleetKnowledge,
}

impl FleetCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent before event processing begins. Ids are unique; a
    /// collision is an error, never a silent replacement.
    pub fn register(&mut self, agent: ServerAgent) -> Result<()> {
        if self.agents.contains_key(agent.id()) {
            return Err(FleetError::DuplicateServer(agent.id().to_string()));
        }
        log::info!("registered {} ({})", agent.id(), agent.role());
        self.agents.insert(agent.id().to_string(), agent);
        Ok(())
    }

    pub fn agent(&self, id: &str) -> Option<&ServerAgent> {
        self.agents.get(id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Registered agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = &ServerAgent> {
        self.agents.values()
    }

    pub fn knowledge(&self) -> &FleetKnowledge {
        &self.knowledge
    }

    /// Process one event end to end. The target must be registered; the
    /// coordinator never guesses a default. Propagation to same-role peers
    /// completes before this returns.
    pub fn process(&mut self, event: &ConfigChangeEvent) -> Result<FleetOutcome> {
        let agent = self
            .agents
            .get_mut(&event.target_server_id)
            .ok_or_else(|| FleetError::UnknownServer(event.target_server_id.clone()))?;
        let evaluation = agent.evaluate(event)?;

        let propagated_to = match evaluation.verdict.decision {
            Decision::Approved => self.propagate(&evaluation),
            Decision::Denied => {
                log::info!(
                    "pattern `{}` confirmed as violation on {}; nothing shared",
                    evaluation.pattern_tag,
                    evaluation.agent_id
                );
                self.knowledge
                    .confirmed_violations
                    .insert(evaluation.pattern_tag.clone());
                Vec::new()
            }
            Decision::Alert => {
                log::warn!(
                    "pattern `{}` on {} flagged for human review",
                    evaluation.pattern_tag,
                    evaluation.agent_id
                );
                self.knowledge.review_queue.push(ReviewFlag {
                    agent_id: evaluation.agent_id.clone(),
                    pattern_tag: evaluation.pattern_tag.clone(),
                    reason: evaluation.verdict.reason.clone(),
                });
                Vec::new()
            }
        };

        Ok(FleetOutcome {
            evaluation,
            propagated_to,
        })
    }

    /// Share an approved pattern with every other agent of the evaluating
    /// agent's role. Synchronous; `learn` is an idempotent set insert.
    fn propagate(&mut self, evaluation: &Evaluation) -> Vec<String> {
        let mut propagated = Vec::new();
        for (id, peer) in self.agents.iter_mut() {
            if id == &evaluation.agent_id || peer.role() != evaluation.role {
                continue;
            }
            peer.learn(&evaluation.pattern_tag);
            propagated.push(id.clone());
        }
        if !propagated.is_empty() {
            log::info!(
                "shared `{}` with {} other {} server(s)",
                evaluation.pattern_tag,
                propagated.len(),
                evaluation.role
            );
        }
        propagated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ServerRole, USER_ADDITION};
    use serde_json::json;
    use std::collections::BTreeMap as Map;

    fn user_addition(server: &str, username: &str) -> ConfigChangeEvent {
        let mut attributes = Map::new();
        attributes.insert("username".to_string(), json!(username));
        ConfigChangeEvent::new(server, USER_ADDITION, attributes, 0)
    }

    fn two_web_fleet() -> FleetCoordinator {
        let mut coordinator = FleetCoordinator::new();
        coordinator
            .register(ServerAgent::with_seed("web-01", ServerRole::Web, 1).unwrap())
            .unwrap();
        coordinator
            .register(ServerAgent::with_seed("web-02", ServerRole::Web, 2).unwrap())
            .unwrap();
        coordinator
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let mut coordinator = two_web_fleet();
        let err = coordinator
            .register(ServerAgent::with_seed("web-01", ServerRole::Web, 3).unwrap())
            .unwrap_err();
        assert!(matches!(err, FleetError::DuplicateServer(id) if id == "web-01"));
        assert_eq!(coordinator.agent_count(), 2);
    }

    #[test]
    fn test_unknown_server_is_an_error() {
        let mut coordinator = two_web_fleet();
        let err = coordinator
            .process(&user_addition("ghost-99", "deploy_user"))
            .unwrap_err();
        assert!(matches!(err, FleetError::UnknownServer(id) if id == "ghost-99"));
    }

    #[test]
    fn test_denied_pattern_is_recorded_as_violation() {
        let mut coordinator = two_web_fleet();
        coordinator
            .register(ServerAgent::with_seed("base-01", ServerRole::Baseline, 3).unwrap())
            .unwrap();

        let outcome = coordinator.process(&user_addition("base-01", "hacker")).unwrap();
        assert_eq!(outcome.evaluation.verdict.decision, Decision::Denied);
        assert!(outcome.propagated_to.is_empty());
        assert!(coordinator
            .knowledge()
            .confirmed_violations
            .contains(&outcome.evaluation.pattern_tag));
    }

    #[test]
    fn test_alert_is_queued_for_review() {
        let mut coordinator = two_web_fleet();
        let outcome = coordinator.process(&user_addition("web-01", "intruder")).unwrap();

        assert_eq!(outcome.evaluation.verdict.decision, Decision::Alert);
        assert!(outcome.propagated_to.is_empty());

        let queue = &coordinator.knowledge().review_queue;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].agent_id, "web-01");
        assert_eq!(queue[0].pattern_tag, outcome.evaluation.pattern_tag);
    }
}
