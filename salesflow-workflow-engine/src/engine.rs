//! The workflow orchestrator
//!
//! Composes the collaborators, the thread store and the registries into
//! the workflow graph, serializes turns per thread, and exposes the
//! single `process_email` entry point.

use crate::adapters::AgentSet;
use crate::email::{synthesize_workflow_id, RawEmail};
use crate::error::WorkflowResult;
use crate::forwarder::ForwarderRegistry;
use crate::graph::{GraphBuilder, NodeId, WorkflowGraph};
use crate::nodes::{self, NodeContext};
use crate::router;
use crate::sales_team::SalesTeam;
use crate::state::{NodeSlot, SlotError, WorkflowState};
use crate::thread_store::ThreadStore;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Engine options; the application config maps onto this.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Directory the thread store persists into
    pub threads_dir: PathBuf,
    /// Sender address stamped on outbound entries
    pub outbound_sender: String,
    /// Quote timeline promised in confirmation acknowledgments
    pub quote_timeline: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            threads_dir: PathBuf::from("data/threads"),
            outbound_sender: "sales-desk@salesflow.example".to_string(),
            quote_timeline: "24 hours".to_string(),
        }
    }
}

/// Completion status of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Completed,
    Failed,
}

/// Result of one `process_email` invocation.
#[derive(Debug)]
pub struct TurnOutcome {
    pub workflow_id: String,
    pub thread_id: String,
    pub status: TurnStatus,
    /// Populated when the turn failed on an uncaught node error
    pub error: Option<String>,
    /// The final (on failure: partial) workflow state of the turn
    pub state: WorkflowState,
}

/// The workflow orchestrator.
pub struct WorkflowEngine {
    ctx: Arc<NodeContext>,
    graph: WorkflowGraph,
    /// One logical lock per thread id; turns for the same thread never
    /// interleave, turns for distinct threads run in parallel.
    thread_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WorkflowEngine {
    /// Create an engine with the built-in registries.
    pub fn new(agents: AgentSet, options: EngineOptions) -> WorkflowResult<Self> {
        Self::with_registries(
            agents,
            options,
            Arc::new(ForwarderRegistry::default_registry()),
            Arc::new(SalesTeam::default_roster()),
        )
    }

    /// Create an engine with explicit forwarder and sales-team registries.
    pub fn with_registries(
        agents: AgentSet,
        options: EngineOptions,
        forwarders: Arc<ForwarderRegistry>,
        sales_team: Arc<SalesTeam>,
    ) -> WorkflowResult<Self> {
        let store = Arc::new(ThreadStore::new(options.threads_dir.clone())?);
        let ctx = Arc::new(NodeContext {
            agents,
            store,
            forwarders,
            sales_team,
            options,
        });
        let graph = build_graph(&ctx)?;
        tracing::info!(nodes = graph.node_count(), "workflow graph built");
        Ok(Self {
            ctx,
            graph,
            thread_locks: DashMap::new(),
        })
    }

    /// The thread store backing this engine.
    pub fn store(&self) -> &ThreadStore {
        &self.ctx.store
    }

    /// Process one inbound email through the complete workflow.
    ///
    /// Exactly one turn runs per thread at a time. The turn always runs
    /// to the terminal node unless a node returns an uncaught error, in
    /// which case the partial state is returned with a failed status.
    pub async fn process_email(&self, raw: RawEmail) -> TurnOutcome {
        let now = Utc::now();
        let workflow_id = synthesize_workflow_id(now);
        let email = raw.normalize(now);
        let thread_id = email.thread_id.clone();
        tracing::info!(%workflow_id, %thread_id, "starting workflow turn");

        let lock = self
            .thread_locks
            .entry(thread_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut state = WorkflowState::initial(email, workflow_id.clone(), now);

        // Snapshot the stored thread at turn entry.
        if let Some(thread) = self.ctx.store.load(&thread_id) {
            tracing::info!(emails = thread.email_chain.len(), "loaded existing thread");
            state.thread_history = thread.email_chain;
            state.cumulative_extraction = thread.cumulative_extraction;
            state.customer_context = thread.customer_context;
            state.forwarder_context = thread.forwarder_context;
        }

        // Missing input: record the error, escalate, commit the inbound
        // email without a response.
        if state.email.is_empty() {
            tracing::error!("email content is missing, no response will be sent");
            state.classification = NodeSlot::Error(SlotError::message("Email content is missing"));
            state.should_escalate = true;
            let patch = nodes::commit_turn(&self.ctx, &state);
            patch.apply(&mut state);
            return TurnOutcome {
                workflow_id,
                thread_id,
                status: TurnStatus::Completed,
                error: None,
                state,
            };
        }

        match self.graph.run(&mut state).await {
            Ok(()) => {
                tracing::info!(%workflow_id, "workflow turn completed");
                TurnOutcome {
                    workflow_id,
                    thread_id,
                    status: TurnStatus::Completed,
                    error: None,
                    state,
                }
            }
            Err(error) => {
                tracing::error!(%workflow_id, %error, "workflow turn failed");
                TurnOutcome {
                    workflow_id,
                    thread_id,
                    status: TurnStatus::Failed,
                    error: Some(error.to_string()),
                    state,
                }
            }
        }
    }
}

/// Wire the workflow graph: nodes, direct edges, and the conditional
/// edges with their declared targets.
fn build_graph(ctx: &Arc<NodeContext>) -> WorkflowResult<WorkflowGraph> {
    GraphBuilder::new()
        .add_node(
            NodeId::ClassifyEmail,
            Arc::new(nodes::ClassifyEmailNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::ConversationState,
            Arc::new(nodes::ConversationStateNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::AnalyzeThread,
            Arc::new(nodes::AnalyzeThreadNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::ExtractInformation,
            Arc::new(nodes::ExtractInformationNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::UpdateCumulativeExtraction,
            Arc::new(nodes::UpdateCumulativeExtractionNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::ValidateData,
            Arc::new(nodes::ValidateDataNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::LookupPorts,
            Arc::new(nodes::LookupPortsNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::StandardizeContainer,
            Arc::new(nodes::StandardizeContainerNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::RecommendRates,
            Arc::new(nodes::RecommendRatesNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::NextAction,
            Arc::new(nodes::NextActionNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::AssignSalesPerson,
            Arc::new(nodes::AssignSalesPersonNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::GenerateClarificationResponse,
            Arc::new(nodes::GenerateClarificationResponseNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::GenerateConfirmationResponse,
            Arc::new(nodes::GenerateConfirmationResponseNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::GenerateAcknowledgmentResponse,
            Arc::new(nodes::GenerateAcknowledgmentResponseNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::GenerateConfirmationAcknowledgment,
            Arc::new(nodes::GenerateConfirmationAcknowledgmentNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::DetectForwarder,
            Arc::new(nodes::DetectForwarderNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::ProcessForwarderResponse,
            Arc::new(nodes::ProcessForwarderResponseNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::AssignForwarders,
            Arc::new(nodes::AssignForwardersNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::NotifySales,
            Arc::new(nodes::NotifySalesNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::GenerateCustomerQuote,
            Arc::new(nodes::GenerateCustomerQuoteNode { ctx: ctx.clone() }),
        )
        .add_node(
            NodeId::UpdateThread,
            Arc::new(nodes::UpdateThreadNode { ctx: ctx.clone() }),
        )
        .set_entry_point(NodeId::ClassifyEmail)
        .add_conditional_edges(
            NodeId::ClassifyEmail,
            router::route_after_classification,
            vec![
                NodeId::ConversationState,
                NodeId::GenerateAcknowledgmentResponse,
            ],
        )
        .add_conditional_edges(
            NodeId::ConversationState,
            router::route_after_conversation_state,
            vec![NodeId::AnalyzeThread],
        )
        .add_edge(NodeId::AnalyzeThread, NodeId::ExtractInformation)
        .add_edge(NodeId::ExtractInformation, NodeId::UpdateCumulativeExtraction)
        .add_edge(NodeId::UpdateCumulativeExtraction, NodeId::ValidateData)
        .add_edge(NodeId::ValidateData, NodeId::LookupPorts)
        .add_edge(NodeId::LookupPorts, NodeId::StandardizeContainer)
        .add_edge(NodeId::StandardizeContainer, NodeId::RecommendRates)
        .add_edge(NodeId::RecommendRates, NodeId::NextAction)
        .add_conditional_edges(
            NodeId::NextAction,
            router::route_after_next_action,
            vec![NodeId::AssignSalesPerson, NodeId::DetectForwarder],
        )
        .add_conditional_edges(
            NodeId::AssignSalesPerson,
            router::route_after_sales_assignment,
            vec![
                NodeId::GenerateClarificationResponse,
                NodeId::GenerateConfirmationResponse,
                NodeId::GenerateConfirmationAcknowledgment,
            ],
        )
        .add_edge(NodeId::GenerateClarificationResponse, NodeId::UpdateThread)
        .add_edge(NodeId::GenerateConfirmationResponse, NodeId::UpdateThread)
        .add_conditional_edges(
            NodeId::GenerateAcknowledgmentResponse,
            router::route_after_acknowledgment,
            vec![NodeId::ProcessForwarderResponse, NodeId::UpdateThread],
        )
        .add_conditional_edges(
            NodeId::GenerateConfirmationAcknowledgment,
            router::route_after_confirmation_acknowledgment,
            vec![NodeId::AssignForwarders, NodeId::UpdateThread],
        )
        .add_edge(NodeId::AssignForwarders, NodeId::UpdateThread)
        .add_edge(NodeId::DetectForwarder, NodeId::ProcessForwarderResponse)
        .add_edge(NodeId::ProcessForwarderResponse, NodeId::NotifySales)
        .add_conditional_edges(
            NodeId::NotifySales,
            router::route_after_sales_notification,
            vec![NodeId::GenerateCustomerQuote, NodeId::UpdateThread],
        )
        .add_edge(NodeId::GenerateCustomerQuote, NodeId::UpdateThread)
        .add_edge(NodeId::UpdateThread, NodeId::End)
        .build()
}
