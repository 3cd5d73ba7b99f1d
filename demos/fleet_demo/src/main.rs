//! Fleet demo: a four-server fleet evaluating user-addition events.
//!
//! Walks the canonical scenario list (deployment user on a web server, a
//! rogue account on the hardened baseline host, a database admin, a second
//! deployment user) and narrates verdicts, confidence and fleet
//! coordination.

use std::collections::BTreeMap;

use anyhow::Result;
use nfi_core::event::USER_ADDITION;
use nfi_core::{ConfigChangeEvent, FleetCoordinator, ServerAgent, ServerRole};
use serde_json::json;
use tracing::info;

fn user_addition(server: &str, username: &str, uid: u64, timestamp_ms: u64) -> ConfigChangeEvent {
    let mut attributes = BTreeMap::new();
    attributes.insert("username".to_string(), json!(username));
    attributes.insert("uid".to_string(), json!(uid));
    ConfigChangeEvent::new(server, USER_ADDITION, attributes, timestamp_ms)
}

fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    println!("Neuromorphic Fleet Intelligence Demo");
    println!("====================================");

    let mut coordinator = FleetCoordinator::new();
    coordinator.register(ServerAgent::with_seed("baseline-01", ServerRole::Baseline, 1)?)?;
    coordinator.register(ServerAgent::with_seed("web-01", ServerRole::Web, 2)?)?;
    coordinator.register(ServerAgent::with_seed("web-02", ServerRole::Web, 3)?)?;
    coordinator.register(ServerAgent::with_seed("db-01", ServerRole::Database, 4)?)?;

    println!("\nFleet initialized:");
    for agent in coordinator.agents() {
        println!("  - {} ({})", agent.id(), agent.role());
    }
    info!(agents = coordinator.agent_count(), "fleet ready");

    let scenarios = vec![
        user_addition("web-01", "deploy_user", 1001, 0),
        user_addition("baseline-01", "hacker", 1002, 500),
        user_addition("db-01", "dbadmin", 1003, 1000),
        user_addition("web-01", "deploy_user2", 1004, 1500),
    ];

    for (step, event) in scenarios.iter().enumerate() {
        println!("\nSCENARIO {}: {} on {}", step + 1, event.category, event.target_server_id);
        if let Some(username) = event.username() {
            println!("  username:    {}", username);
        }

        let outcome = coordinator.process(event)?;
        let verdict = &outcome.evaluation.verdict;
        println!("  pattern:     {}", outcome.evaluation.pattern_tag);
        println!("  decision:    {} ({:.1}% confidence)", verdict.decision, verdict.confidence);
        println!("  reason:      {}", verdict.reason);
        if outcome.propagated_to.is_empty() {
            println!("  propagation: none");
        } else {
            println!("  propagation: shared with {}", outcome.propagated_to.join(", "));
        }
    }

    println!("\nFleet summary:");
    for agent in coordinator.agents() {
        let learned: Vec<&str> = agent.learned_patterns().iter().map(String::as_str).collect();
        println!(
            "  {} ({}): learned [{}]",
            agent.id(),
            agent.role(),
            learned.join(", ")
        );
    }
    let knowledge = coordinator.knowledge();
    println!(
        "  confirmed violations: {}",
        knowledge
            .confirmed_violations
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  alerts awaiting review: {}", knowledge.review_queue.len());

    Ok(())
}
