use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FleetError, Result};

/// Category string for account-creation events.
pub const USER_ADDITION: &str = "user_addition";

/// Operational role of a server in the fleet. The role selects which
/// encoding rules and policy expectations apply to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRole {
    /// Hardened golden-image host. No account changes are ever expected.
    Baseline,
    /// Application web server. Deployment accounts are routine.
    Web,
    /// Database server. Admin accounts following the naming convention are routine.
    Database,
}

impl ServerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerRole::Baseline => "baseline",
            ServerRole::Web => "web",
            ServerRole::Database => "database",
        }
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parsed configuration-change event. Immutable once created; the
/// core never parses raw text or config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigChangeEvent {
    /// Id of the server the change was observed on.
    pub target_server_id: String,
    /// Change category, e.g. `user_addition`.
    pub category: String,
    /// Category-specific attributes, e.g. `username`, `uid`.
    pub attributes: BTreeMap<String, Value>,
    /// Monotonic reading in milliseconds, supplied by the caller.
    pub timestamp_ms: u64,
}

impl ConfigChangeEvent {
    pub fn new(
        target_server_id: impl Into<String>,
        category: impl Into<String>,
        attributes: BTreeMap<String, Value>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            target_server_id: target_server_id.into(),
            category: category.into(),
            attributes,
            timestamp_ms,
        }
    }

    /// The `username` attribute, if present as a non-empty string.
    pub fn username(&self) -> Option<&str> {
        self.attributes
            .get("username")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Reject events whose category requires attributes they do not carry.
    /// Runs before encoding so a missing attribute can never silently shift
    /// the policy outcome.
    pub fn validate(&self) -> Result<()> {
        if self.category == USER_ADDITION && self.username().is_none() {
            return Err(FleetError::MalformedEvent(format!(
                "{} event on `{}` lacks a username attribute",
                USER_ADDITION, self.target_server_id
            )));
        }
        Ok(())
    }
}
