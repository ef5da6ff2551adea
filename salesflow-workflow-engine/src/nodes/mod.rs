//! Workflow node implementations
//!
//! Each node wraps one adapter call (or one piece of pure orchestration),
//! converts failures into its own slot and returns a patch. Nodes never
//! write another node's slot, with one sanctioned exception: the
//! mandatory-field gate substitutes a clarification payload when it
//! suppresses a confirmation.

mod commit;
mod enrich;
mod forwarding;
mod ingest;
mod respond;

pub(crate) use commit::{commit_turn, UpdateThreadNode};
pub(crate) use enrich::{
    AssignSalesPersonNode, LookupPortsNode, NextActionNode, RecommendRatesNode,
    StandardizeContainerNode, ValidateDataNode,
};
pub(crate) use forwarding::{
    AssignForwardersNode, DetectForwarderNode, NotifySalesNode, ProcessForwarderResponseNode,
};
pub(crate) use ingest::{
    AnalyzeThreadNode, ClassifyEmailNode, ConversationStateNode, ExtractInformationNode,
    UpdateCumulativeExtractionNode,
};
pub(crate) use respond::{
    GenerateAcknowledgmentResponseNode, GenerateClarificationResponseNode,
    GenerateConfirmationAcknowledgmentNode, GenerateConfirmationResponseNode,
    GenerateCustomerQuoteNode,
};

use crate::adapters::AgentSet;
use crate::engine::EngineOptions;
use crate::forwarder::ForwarderRegistry;
use crate::sales_team::SalesTeam;
use crate::thread_store::ThreadStore;
use std::sync::Arc;

/// Shared context handed to every node.
pub(crate) struct NodeContext {
    pub agents: AgentSet,
    pub store: Arc<ThreadStore>,
    pub forwarders: Arc<ForwarderRegistry>,
    pub sales_team: Arc<SalesTeam>,
    pub options: EngineOptions,
}
