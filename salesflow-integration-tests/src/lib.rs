//! End-to-end scenario tests for the salesflow engine
//!
//! Shared fixtures for the scenario suites under `tests/`.

use salesflow_agents::reference_agent_set;
use salesflow_workflow_engine::{
    EngineOptions, ForwarderRegistry, RawEmail, SalesTeam, WorkflowEngine,
};
use std::path::Path;
use std::sync::Arc;

/// An engine wired with the reference collaborators, persisting into the
/// given directory.
pub fn engine_at(threads_dir: &Path) -> WorkflowEngine {
    let forwarders = Arc::new(ForwarderRegistry::default_registry());
    let sales_team = Arc::new(SalesTeam::default_roster());
    let agents = reference_agent_set(forwarders.clone(), sales_team.clone());
    let options = EngineOptions {
        threads_dir: threads_dir.to_path_buf(),
        ..Default::default()
    };
    match WorkflowEngine::with_registries(agents, options, forwarders, sales_team) {
        Ok(engine) => engine,
        Err(error) => panic!("engine construction failed: {}", error),
    }
}

/// An inbound customer email on a fixed thread.
pub fn customer_email(thread_id: &str, subject: &str, content: &str) -> RawEmail {
    RawEmail {
        sender: "john.doe@techcorp.com".to_string(),
        sender_name: None,
        subject: subject.to_string(),
        content: content.to_string(),
        thread_id: Some(thread_id.to_string()),
    }
}
