//! Spike Encoding of Configuration Changes
//!
//! Converts a [`ConfigChangeEvent`] into a [`SpikeFeature`] through an
//! ordered rule table: each row pairs a matcher (category, optional role,
//! optional account-name prefix) with a spike template. First match wins and
//! a default row is always present, so encoding is pure and total. Timing
//! and intensity values are design constants kept in the table, not in
//! `encode`'s control flow, so policy tuning never touches the encoder.

use serde::{Deserialize, Serialize};

use crate::event::{ConfigChangeEvent, ServerRole, USER_ADDITION};

/// Pattern tags produced by the default rule table and consumed by the
/// policy lookup.
pub mod tags {
    pub const WEB_DEPLOY_USER: &str = "web_deploy_user";
    pub const BASELINE_USER_VIOLATION: &str = "baseline_user_violation";
    pub const DB_ADMIN_USER: &str = "db_admin_user";
    pub const UNEXPECTED_USER: &str = "unexpected_user";
    pub const GENERIC_CHANGE: &str = "generic_change";
}

/// Recognized deployment-account naming convention on web servers.
const DEPLOY_ACCOUNT_PREFIX: &str = "deploy";

/// Recognized admin-account naming convention on database servers.
const DB_ACCOUNT_PREFIX: &str = "db";

/// The encoded representation of a configuration change, analogous to a
/// neural spike train. Produced fresh per event; immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeFeature {
    /// Spike timings relative to the evaluation window, each in [0, 1].
    pub spike_times: Vec<f32>,
    /// Non-negative magnitude driving the reservoir input.
    pub intensity: f32,
    /// Categorical label; the sole key into the policy lookup table.
    pub pattern_tag: String,
}

/// Design constants for one pattern class.
#[derive(Debug, Clone, Copy)]
pub struct SpikeTemplate {
    pub spike_times: &'static [f32],
    pub intensity: f32,
    pub pattern_tag: &'static str,
}

impl SpikeTemplate {
    fn instantiate(&self) -> SpikeFeature {
        SpikeFeature {
            spike_times: self.spike_times.to_vec(),
            intensity: self.intensity,
            pattern_tag: self.pattern_tag.to_string(),
        }
    }
}

/// Burst pattern: any account on a baseline host is inherently anomalous.
const BASELINE_VIOLATION: SpikeTemplate = SpikeTemplate {
    spike_times: &[0.1, 0.15, 0.2, 0.25, 0.3],
    intensity: 8.0,
    pattern_tag: tags::BASELINE_USER_VIOLATION,
};

/// Regular low-intensity pattern: deployment accounts are routine on web servers.
const WEB_DEPLOY: SpikeTemplate = SpikeTemplate {
    spike_times: &[0.1, 0.3, 0.5],
    intensity: 3.0,
    pattern_tag: tags::WEB_DEPLOY_USER,
};

/// Low-intensity pattern: admin accounts are routine on database servers.
const DB_ADMIN: SpikeTemplate = SpikeTemplate {
    spike_times: &[0.1, 0.4, 0.7],
    intensity: 4.0,
    pattern_tag: tags::DB_ADMIN_USER,
};

/// Irregular high-intensity pattern for accounts matching no convention.
const UNEXPECTED_USER: SpikeTemplate = SpikeTemplate {
    spike_times: &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
    intensity: 7.0,
    pattern_tag: tags::UNEXPECTED_USER,
};

/// Short mid-range pattern carrying little information, for any category
/// without dedicated rules.
const GENERIC_CHANGE: SpikeTemplate = SpikeTemplate {
    spike_times: &[0.1, 0.5],
    intensity: 5.0,
    pattern_tag: tags::GENERIC_CHANGE,
};

/// One row of the encoding rule table. Conditions are AND-ed; `None`
/// matches anything.
#[derive(Debug, Clone)]
pub struct EncodingRule {
    /// Event category this rule applies to.
    pub category: &'static str,
    /// Required server role, if any.
    pub role: Option<ServerRole>,
    /// Required account-name prefix, if any.
    pub username_prefix: Option<&'static str>,
    /// Template emitted when the rule matches.
    pub template: SpikeTemplate,
}

impl EncodingRule {
    fn matches(&self, event: &ConfigChangeEvent, role: ServerRole) -> bool {
        if event.category != self.category {
            return false;
        }
        if let Some(required) = self.role {
            if role != required {
                return false;
            }
        }
        if let Some(prefix) = self.username_prefix {
            match event.username() {
                Some(name) if name.starts_with(prefix) => {}
                _ => return false,
            }
        }
        true
    }
}

/// The default rule table, first match wins. Tune intensities, timings and
/// naming conventions here.
fn default_rules() -> Vec<EncodingRule> {
    vec![
        EncodingRule {
            category: USER_ADDITION,
            role: Some(ServerRole::Baseline),
            username_prefix: None,
            template: BASELINE_VIOLATION,
        },
        EncodingRule {
            category: USER_ADDITION,
            role: Some(ServerRole::Web),
            username_prefix: Some(DEPLOY_ACCOUNT_PREFIX),
            template: WEB_DEPLOY,
        },
        EncodingRule {
            category: USER_ADDITION,
            role: Some(ServerRole::Database),
            username_prefix: Some(DB_ACCOUNT_PREFIX),
            template: DB_ADMIN,
        },
        EncodingRule {
            category: USER_ADDITION,
            role: None,
            username_prefix: None,
            template: UNEXPECTED_USER,
        },
    ]
}

/// Converts configuration-change events into spike features. Stateless: the
/// rule table is fixed after construction.
#[derive(Debug, Clone)]
pub struct SpikeEncoder {
    rules: Vec<EncodingRule>,
    default_template: SpikeTemplate,
}

impl Default for SpikeEncoder {
    fn default() -> Self {
        Self::new(default_rules(), GENERIC_CHANGE)
    }
}

impl SpikeEncoder {
    /// Encoder with a custom rule table. The default template fires when no
    /// rule matches, keeping `encode` total.
    pub fn new(rules: Vec<EncodingRule>, default_template: SpikeTemplate) -> Self {
        Self {
            rules,
            default_template,
        }
    }

    /// Encode an event observed on a server with the given role. Pure and
    /// total: every (category, role) combination yields a feature.
    pub fn encode(&self, event: &ConfigChangeEvent, role: ServerRole) -> SpikeFeature {
        for rule in &self.rules {
            if rule.matches(event, role) {
                return rule.template.instantiate();
            }
        }
        self.default_template.instantiate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn user_addition(username: &str) -> ConfigChangeEvent {
        let mut attributes = BTreeMap::new();
        attributes.insert("username".to_string(), json!(username));
        ConfigChangeEvent::new("some-server", USER_ADDITION, attributes, 0)
    }

    #[test]
    fn test_baseline_any_username_is_violation() {
        let encoder = SpikeEncoder::default();
        for username in ["hacker", "deploy_user", "dbadmin", "root"] {
            let feature = encoder.encode(&user_addition(username), ServerRole::Baseline);
            assert_eq!(
                feature.pattern_tag,
                tags::BASELINE_USER_VIOLATION,
                "username `{}` should still violate baseline policy",
                username
            );
            assert_eq!(feature.intensity, 8.0);
        }
    }

    #[test]
    fn test_web_deploy_convention_is_recognized() {
        let encoder = SpikeEncoder::default();
        let feature = encoder.encode(&user_addition("deploy_user"), ServerRole::Web);
        assert_eq!(feature.pattern_tag, tags::WEB_DEPLOY_USER);
        assert_eq!(feature.intensity, 3.0);
        assert_eq!(feature.spike_times, vec![0.1, 0.3, 0.5]);
    }

    #[test]
    fn test_web_unrecognized_username_is_unexpected() {
        let encoder = SpikeEncoder::default();
        let feature = encoder.encode(&user_addition("intruder"), ServerRole::Web);
        assert_eq!(feature.pattern_tag, tags::UNEXPECTED_USER);
        assert_eq!(feature.intensity, 7.0);
    }

    #[test]
    fn test_db_admin_convention_is_recognized() {
        let encoder = SpikeEncoder::default();
        let feature = encoder.encode(&user_addition("dbadmin"), ServerRole::Database);
        assert_eq!(feature.pattern_tag, tags::DB_ADMIN_USER);

        let feature = encoder.encode(&user_addition("admin"), ServerRole::Database);
        assert_eq!(feature.pattern_tag, tags::UNEXPECTED_USER);
    }

    #[test]
    fn test_other_categories_fall_through_to_generic() {
        let encoder = SpikeEncoder::default();
        let event = ConfigChangeEvent::new("some-server", "package_install", BTreeMap::new(), 0);
        let feature = encoder.encode(&event, ServerRole::Web);
        assert_eq!(feature.pattern_tag, tags::GENERIC_CHANGE);
        assert_eq!(feature.intensity, 5.0);
    }

    #[test]
    fn test_missing_username_still_encodes() {
        // Validation rejects such events upstream; the encoder itself stays
        // total and maps them to the unexpected pattern.
        let encoder = SpikeEncoder::default();
        let event = ConfigChangeEvent::new("some-server", USER_ADDITION, BTreeMap::new(), 0);
        let feature = encoder.encode(&event, ServerRole::Web);
        assert_eq!(feature.pattern_tag, tags::UNEXPECTED_USER);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // The baseline row precedes the prefix rows, so a deploy-named
        // account on a baseline host is still a violation.
        let encoder = SpikeEncoder::default();
        let feature = encoder.encode(&user_addition("deploy_user"), ServerRole::Baseline);
        assert_eq!(feature.pattern_tag, tags::BASELINE_USER_VIOLATION);
    }

    #[test]
    fn test_spike_times_stay_within_window() {
        let encoder = SpikeEncoder::default();
        for role in [ServerRole::Baseline, ServerRole::Web, ServerRole::Database] {
            let feature = encoder.encode(&user_addition("someone"), role);
            assert!(
                feature
                    .spike_times
                    .iter()
                    .all(|&t| (0.0..=1.0).contains(&t)),
                "spike times must stay in [0, 1]"
            );
            assert!(feature.intensity >= 0.0);
        }
    }
}
