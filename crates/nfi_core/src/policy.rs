//! Policy Evaluation
//!
//! Maps a spike feature's pattern tag to a categorical verdict through a
//! static lookup table with an explicit default arm: a tag missing from the
//! table resolves to an Alert, never to a lookup failure. The reservoir
//! state contributes only the confidence score; it can never flip the
//! categorical decision.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoder::{tags, SpikeFeature};
use crate::reservoir::StateVector;

/// Categorical outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Denied,
    Alert,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Denied => "denied",
            Decision::Alert => "alert",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of pipeline output: a categorical decision, a human-readable
/// reason, and a confidence score in [0, 100]. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: String,
    pub confidence: f32,
}

/// Reason attached to pattern tags absent from the lookup table.
const UNKNOWN_PATTERN_REASON: &str = "Unknown pattern detected";

/// Static pattern-tag lookup. Stateless beyond the table built at
/// construction.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    table: BTreeMap<&'static str, (Decision, &'static str)>,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyEngine {
    pub fn new() -> Self {
        let mut table = BTreeMap::new();
        table.insert(
            tags::WEB_DEPLOY_USER,
            (Decision::Approved, "Deployment user on web server"),
        );
        table.insert(
            tags::BASELINE_USER_VIOLATION,
            (Decision::Denied, "User addition on baseline server"),
        );
        table.insert(tags::DB_ADMIN_USER, (Decision::Approved, "Database admin user"));
        table.insert(
            tags::UNEXPECTED_USER,
            (Decision::Alert, "Unexpected user addition"),
        );
        Self { table }
    }

    /// Evaluate a feature against the table. Pure and total: unknown tags
    /// take the default Alert arm for human review.
    pub fn evaluate(&self, feature: &SpikeFeature, state: &StateVector) -> Verdict {
        let (decision, reason) = self
            .table
            .get(feature.pattern_tag.as_str())
            .copied()
            .unwrap_or((Decision::Alert, UNKNOWN_PATTERN_REASON));

        Verdict {
            decision,
            reason: reason.to_string(),
            confidence: confidence(state),
        }
    }
}

/// Confidence is the mean absolute reservoir activation scaled to [0, 100].
/// Monotone in activation magnitude; a secondary signal only.
fn confidence(state: &StateVector) -> f32 {
    (state.mean_abs() * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(tag: &str) -> SpikeFeature {
        SpikeFeature {
            spike_times: vec![0.1],
            intensity: 5.0,
            pattern_tag: tag.to_string(),
        }
    }

    #[test]
    fn test_known_tags_map_to_table_entries() {
        let engine = PolicyEngine::new();
        let state = StateVector::zero(4);

        let verdict = engine.evaluate(&feature(tags::WEB_DEPLOY_USER), &state);
        assert_eq!(verdict.decision, Decision::Approved);
        assert_eq!(verdict.reason, "Deployment user on web server");

        let verdict = engine.evaluate(&feature(tags::BASELINE_USER_VIOLATION), &state);
        assert_eq!(verdict.decision, Decision::Denied);

        let verdict = engine.evaluate(&feature(tags::DB_ADMIN_USER), &state);
        assert_eq!(verdict.decision, Decision::Approved);

        let verdict = engine.evaluate(&feature(tags::UNEXPECTED_USER), &state);
        assert_eq!(verdict.decision, Decision::Alert);
    }

    #[test]
    fn test_unknown_tag_takes_default_alert_arm() {
        let engine = PolicyEngine::new();
        let state = StateVector::zero(4);

        for tag in [tags::GENERIC_CHANGE, "never_seen_before", ""] {
            let verdict = engine.evaluate(&feature(tag), &state);
            assert_eq!(verdict.decision, Decision::Alert, "tag `{}`", tag);
            assert_eq!(verdict.reason, UNKNOWN_PATTERN_REASON);
        }
    }

    #[test]
    fn test_confidence_scales_with_activation() {
        let engine = PolicyEngine::new();

        let quiet = StateVector::from_values(vec![0.0, 0.0, 0.0, 0.0]);
        let verdict = engine.evaluate(&feature(tags::WEB_DEPLOY_USER), &quiet);
        assert_eq!(verdict.confidence, 0.0);

        let active = StateVector::from_values(vec![0.5, -0.5, 0.5, -0.5]);
        let verdict = engine.evaluate(&feature(tags::WEB_DEPLOY_USER), &active);
        assert!((verdict.confidence - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_confidence_is_clamped_for_any_state() {
        let engine = PolicyEngine::new();

        // Activations outside the usual (-1, 1) band still clamp to 100.
        let loud = StateVector::from_values(vec![10.0, -25.0]);
        let verdict = engine.evaluate(&feature(tags::UNEXPECTED_USER), &loud);
        assert_eq!(verdict.confidence, 100.0);

        let empty = StateVector::from_values(Vec::new());
        let verdict = engine.evaluate(&feature(tags::UNEXPECTED_USER), &empty);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_confidence_never_changes_the_decision() {
        let engine = PolicyEngine::new();
        let quiet = StateVector::zero(8);
        let loud = StateVector::from_values(vec![0.99; 8]);

        for tag in [
            tags::WEB_DEPLOY_USER,
            tags::BASELINE_USER_VIOLATION,
            tags::UNEXPECTED_USER,
        ] {
            let a = engine.evaluate(&feature(tag), &quiet);
            let b = engine.evaluate(&feature(tag), &loud);
            assert_eq!(a.decision, b.decision, "tag `{}`", tag);
        }
    }
}
