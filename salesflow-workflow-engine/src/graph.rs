//! Directed workflow graph and its single-threaded cooperative runner
//!
//! Nodes are async-capable transformers from a read-only view of the
//! state to a patch. Edges are either direct or conditional; conditional
//! edges declare their possible targets so the graph can be validated
//! for reachability before it ever runs a turn.

use crate::error::{WorkflowError, WorkflowResult};
use crate::state::{StatePatch, WorkflowState};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Identifier of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    ClassifyEmail,
    ConversationState,
    AnalyzeThread,
    ExtractInformation,
    UpdateCumulativeExtraction,
    ValidateData,
    LookupPorts,
    StandardizeContainer,
    RecommendRates,
    NextAction,
    AssignSalesPerson,
    GenerateClarificationResponse,
    GenerateConfirmationResponse,
    GenerateAcknowledgmentResponse,
    GenerateConfirmationAcknowledgment,
    DetectForwarder,
    ProcessForwarderResponse,
    AssignForwarders,
    NotifySales,
    GenerateCustomerQuote,
    UpdateThread,
    /// Terminal sentinel; not a runnable node
    End,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeId::ClassifyEmail => "classify_email",
            NodeId::ConversationState => "conversation_state",
            NodeId::AnalyzeThread => "analyze_thread",
            NodeId::ExtractInformation => "extract_information",
            NodeId::UpdateCumulativeExtraction => "update_cumulative_extraction",
            NodeId::ValidateData => "validate_data",
            NodeId::LookupPorts => "lookup_ports",
            NodeId::StandardizeContainer => "standardize_container",
            NodeId::RecommendRates => "recommend_rates",
            NodeId::NextAction => "next_action",
            NodeId::AssignSalesPerson => "assign_sales_person",
            NodeId::GenerateClarificationResponse => "generate_clarification_response",
            NodeId::GenerateConfirmationResponse => "generate_confirmation_response",
            NodeId::GenerateAcknowledgmentResponse => "generate_acknowledgment_response",
            NodeId::GenerateConfirmationAcknowledgment => "generate_confirmation_acknowledgment",
            NodeId::DetectForwarder => "detect_forwarder",
            NodeId::ProcessForwarderResponse => "process_forwarder_response",
            NodeId::AssignForwarders => "assign_forwarders",
            NodeId::NotifySales => "notify_sales",
            NodeId::GenerateCustomerQuote => "generate_customer_quote",
            NodeId::UpdateThread => "update_thread",
            NodeId::End => "END",
        };
        write!(f, "{}", name)
    }
}

/// An async-capable node. Suspension occurs only at adapter boundaries
/// inside `run`; the engine runs one node at a time.
#[async_trait]
pub trait WorkflowNode: Send + Sync {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch>;
}

/// Routing decision function of a conditional edge.
pub type EdgeDecision = fn(&WorkflowState) -> NodeId;

/// Outgoing edge of a node.
enum Edge {
    Direct(NodeId),
    Conditional {
        decide: EdgeDecision,
        targets: Vec<NodeId>,
    },
}

impl Edge {
    fn targets(&self) -> Vec<NodeId> {
        match self {
            Edge::Direct(target) => vec![*target],
            Edge::Conditional { targets, .. } => targets.clone(),
        }
    }
}

/// Builder for a [`WorkflowGraph`].
#[derive(Default)]
pub struct GraphBuilder {
    nodes: BTreeMap<NodeId, Arc<dyn WorkflowNode>>,
    edges: BTreeMap<NodeId, Edge>,
    entry: Option<NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(mut self, id: NodeId, node: Arc<dyn WorkflowNode>) -> Self {
        self.nodes.insert(id, node);
        self
    }

    pub fn set_entry_point(mut self, id: NodeId) -> Self {
        self.entry = Some(id);
        self
    }

    pub fn add_edge(mut self, from: NodeId, to: NodeId) -> Self {
        self.edges.insert(from, Edge::Direct(to));
        self
    }

    /// Add a conditional edge; `targets` are the nodes `decide` may
    /// return and are checked during validation.
    pub fn add_conditional_edges(
        mut self,
        from: NodeId,
        decide: EdgeDecision,
        targets: Vec<NodeId>,
    ) -> Self {
        self.edges.insert(from, Edge::Conditional { decide, targets });
        self
    }

    /// Validate wiring and produce the runnable graph.
    ///
    /// Every registered node must be reachable from the entry point,
    /// every edge target must be registered (or `End`), every node must
    /// have an outgoing edge, and `End` must be reachable.
    pub fn build(self) -> WorkflowResult<WorkflowGraph> {
        let entry = self
            .entry
            .ok_or_else(|| WorkflowError::InvalidGraph("no entry point".to_string()))?;
        if !self.nodes.contains_key(&entry) {
            return Err(WorkflowError::InvalidGraph(format!(
                "entry point {} is not a registered node",
                entry
            )));
        }

        for (from, edge) in &self.edges {
            for target in edge.targets() {
                if target != NodeId::End && !self.nodes.contains_key(&target) {
                    return Err(WorkflowError::InvalidGraph(format!(
                        "edge {} -> {} points at an unregistered node",
                        from, target
                    )));
                }
            }
        }

        let mut reachable: BTreeSet<NodeId> = BTreeSet::new();
        let mut queue = VecDeque::from([entry]);
        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id) || id == NodeId::End {
                continue;
            }
            let edge = self.edges.get(&id).ok_or_else(|| {
                WorkflowError::InvalidGraph(format!("node {} has no outgoing edge", id))
            })?;
            for target in edge.targets() {
                queue.push_back(target);
            }
        }

        for id in self.nodes.keys() {
            if !reachable.contains(id) {
                return Err(WorkflowError::InvalidGraph(format!(
                    "node {} is unreachable from the entry point",
                    id
                )));
            }
        }
        if !reachable.contains(&NodeId::End) {
            return Err(WorkflowError::InvalidGraph(
                "END is unreachable".to_string(),
            ));
        }

        Ok(WorkflowGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
        })
    }
}

/// A validated workflow graph.
pub struct WorkflowGraph {
    nodes: BTreeMap<NodeId, Arc<dyn WorkflowNode>>,
    edges: BTreeMap<NodeId, Edge>,
    entry: NodeId,
}

impl WorkflowGraph {
    /// Run one turn to completion.
    ///
    /// The state is advanced node by node until the terminal edge; an
    /// `Err` from a node aborts the turn and the caller receives the
    /// partially-filled state it already holds.
    pub async fn run(&self, state: &mut WorkflowState) -> WorkflowResult<()> {
        let mut current = self.entry;
        // A DAG visits each node at most once; the cap catches wiring bugs.
        let mut remaining_steps = self.nodes.len() + 1;

        while current != NodeId::End {
            if remaining_steps == 0 {
                return Err(WorkflowError::Internal(format!(
                    "step limit exhausted at node {}",
                    current
                )));
            }
            remaining_steps -= 1;

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| WorkflowError::NodeNotFound(current.to_string()))?;

            tracing::debug!(node = %current, "running node");
            let patch = node.run(state).await?;
            patch.apply(state);

            current = match self.edges.get(&current) {
                Some(Edge::Direct(target)) => *target,
                Some(Edge::Conditional { decide, .. }) => {
                    let target = decide(state);
                    tracing::debug!(from = %current, to = %target, "conditional route");
                    target
                }
                None => return Err(WorkflowError::NodeNotFound(current.to_string())),
            };
        }
        Ok(())
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopNode;

    #[async_trait]
    impl WorkflowNode for NoopNode {
        async fn run(&self, _state: &WorkflowState) -> WorkflowResult<StatePatch> {
            Ok(StatePatch::default())
        }
    }

    fn builder_with(ids: &[NodeId]) -> GraphBuilder {
        let mut builder = GraphBuilder::new();
        for id in ids {
            builder = builder.add_node(*id, Arc::new(NoopNode));
        }
        builder
    }

    #[test]
    fn build_rejects_missing_entry() {
        let result = builder_with(&[NodeId::ClassifyEmail]).build();
        assert!(matches!(result, Err(WorkflowError::InvalidGraph(_))));
    }

    #[test]
    fn build_rejects_unreachable_node() {
        let result = builder_with(&[NodeId::ClassifyEmail, NodeId::UpdateThread])
            .set_entry_point(NodeId::ClassifyEmail)
            .add_edge(NodeId::ClassifyEmail, NodeId::End)
            .add_edge(NodeId::UpdateThread, NodeId::End)
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidGraph(_))));
    }

    #[test]
    fn build_rejects_edge_to_unregistered_node() {
        let result = builder_with(&[NodeId::ClassifyEmail])
            .set_entry_point(NodeId::ClassifyEmail)
            .add_edge(NodeId::ClassifyEmail, NodeId::UpdateThread)
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidGraph(_))));
    }

    #[test]
    fn build_rejects_node_without_outgoing_edge() {
        let result = builder_with(&[NodeId::ClassifyEmail])
            .set_entry_point(NodeId::ClassifyEmail)
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidGraph(_))));
    }

    #[test]
    fn build_accepts_linear_graph() {
        let graph = builder_with(&[NodeId::ClassifyEmail, NodeId::UpdateThread])
            .set_entry_point(NodeId::ClassifyEmail)
            .add_edge(NodeId::ClassifyEmail, NodeId::UpdateThread)
            .add_edge(NodeId::UpdateThread, NodeId::End)
            .build()
            .unwrap();
        assert_eq!(graph.entry(), NodeId::ClassifyEmail);
        assert_eq!(graph.node_count(), 2);
    }
}
