//! Deterministic reference collaborators for the salesflow workflow
//! engine
//!
//! Each collaborator implements one adapter contract from
//! `salesflow_workflow_engine::adapters` with rule-based heuristics:
//! registry lookups for sender classification, line and pattern matching
//! for extraction, embedded tables for ports and market rates, and
//! deterministic response rendering. No language model is involved, so
//! every turn is replayable.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod analysis;
mod classifier;
mod container;
mod conversation;
mod extractor;
mod forwarder_ops;
mod next_action;
mod notify;
mod ports;
mod rates;
mod responses;
mod validation;

pub use analysis::ThreadAnalysisAgent;
pub use classifier::EmailClassifierAgent;
pub use container::ContainerStandardizationAgent;
pub use conversation::ConversationStateAssessor;
pub use extractor::InformationExtractionAgent;
pub use forwarder_ops::{ForwarderDetectionAgent, ForwarderEmailDraftAgent, ForwarderResponseAgent};
pub use next_action::NextActionDecider;
pub use notify::SalesNotificationAgent;
pub use ports::PortLookupAgent;
pub use rates::RateRecommendationAgent;
pub use responses::{
    AcknowledgmentResponseAgent, ClarificationResponseAgent, ConfirmationAcknowledgmentAgent,
    ConfirmationResponseAgent,
};
pub use validation::DataValidationAgent;

use salesflow_workflow_engine::adapters::AgentSet;
use salesflow_workflow_engine::forwarder::ForwarderRegistry;
use salesflow_workflow_engine::sales_team::SalesTeam;
use std::sync::Arc;

/// Build the full reference collaborator set.
///
/// The classifier shares the forwarder registry and sales roster with
/// the engine so sender classification and forwarder detection agree.
pub fn reference_agent_set(
    forwarders: Arc<ForwarderRegistry>,
    sales_team: Arc<SalesTeam>,
) -> AgentSet {
    AgentSet {
        classifier: Arc::new(EmailClassifierAgent::new(
            forwarders.clone(),
            sales_team.clone(),
        )),
        conversation: Arc::new(ConversationStateAssessor),
        thread_analyzer: Arc::new(ThreadAnalysisAgent),
        extractor: Arc::new(InformationExtractionAgent::new()),
        validator: Arc::new(DataValidationAgent),
        port_lookup: Arc::new(PortLookupAgent),
        container: Arc::new(ContainerStandardizationAgent),
        rates: Arc::new(RateRecommendationAgent),
        next_action: Arc::new(NextActionDecider),
        clarification: Arc::new(ClarificationResponseAgent),
        confirmation: Arc::new(ConfirmationResponseAgent),
        acknowledgment: Arc::new(AcknowledgmentResponseAgent),
        confirmation_ack: Arc::new(ConfirmationAcknowledgmentAgent),
        forwarder_detector: Arc::new(ForwarderDetectionAgent),
        forwarder_reply: Arc::new(ForwarderResponseAgent::new()),
        forwarder_draft: Arc::new(ForwarderEmailDraftAgent),
        sales_notifier: Arc::new(SalesNotificationAgent),
    }
}
