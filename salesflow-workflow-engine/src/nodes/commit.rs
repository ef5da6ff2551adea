//! The turn committer
//!
//! Final node of every turn: appends the inbound email to the thread,
//! appends the single primary outbound response when one was produced,
//! copies the thread's cumulative extraction back into the state, and
//! marks the workflow completed. Thread-store failures degrade to a
//! placeholder thread; the turn never crashes here.

use super::NodeContext;
use crate::adapters::ResponsePayload;
use crate::error::WorkflowResult;
use crate::graph::WorkflowNode;
use crate::state::{StatePatch, WorkflowState};
use crate::thread_store::{Direction, EmailEntry, ThreadData};
use async_trait::async_trait;
use std::sync::Arc;

/// The single primary outbound payload of a turn, chosen in the priority
/// clarification, confirmation, acknowledgment, confirmation
/// acknowledgment, customer quote. Error slots are skipped.
pub(crate) fn select_primary_response(state: &WorkflowState) -> Option<&ResponsePayload> {
    state
        .clarification_response
        .as_ready()
        .or_else(|| state.confirmation_response.as_ready())
        .or_else(|| state.acknowledgment_response.as_ready())
        .or_else(|| state.confirmation_acknowledgment.as_ready())
        .or_else(|| state.customer_quote.as_ready())
}

/// Commit one turn. Factored out of the node so the orchestrator can
/// commit directly when a turn short-circuits on missing input.
pub(crate) fn commit_turn(ctx: &NodeContext, state: &WorkflowState) -> StatePatch {
    let mut patch = StatePatch::default();

    let response_type = state
        .next_action
        .as_ready()
        .map(|n| n.action.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let inbound = EmailEntry {
        timestamp: state.timestamp,
        email_id: state.workflow_id.clone(),
        sender: state.email.sender.clone(),
        direction: Direction::Inbound,
        subject: state.email.subject.clone(),
        content: state.email.content.clone(),
        extracted_data: state
            .extraction
            .as_ready()
            .map(|o| o.extracted_data.clone()),
        response_type: Some(response_type),
        bot_response: None,
        workflow_id: Some(state.workflow_id.clone()),
    };

    let mut thread = match ctx.store.append(&state.thread_id, inbound) {
        Some(thread) => thread,
        None => {
            tracing::warn!(
                thread_id = %state.thread_id,
                "thread store failed, continuing with placeholder thread"
            );
            ThreadData::placeholder(state.thread_id.clone())
        }
    };

    if let Some(response) = select_primary_response(state) {
        let outbound = EmailEntry {
            timestamp: state.timestamp,
            email_id: crate::email::outbound_email_id(&state.workflow_id),
            sender: ctx.options.outbound_sender.clone(),
            direction: Direction::Outbound,
            subject: response.subject.clone(),
            content: response.body.clone(),
            extracted_data: None,
            response_type: Some(response.response_type.clone()),
            bot_response: serde_json::to_value(response).ok(),
            workflow_id: Some(state.workflow_id.clone()),
        };
        match ctx.store.append(&state.thread_id, outbound) {
            Some(updated) => thread = updated,
            None => tracing::warn!(
                thread_id = %state.thread_id,
                "outbound entry not persisted"
            ),
        }
        tracing::info!(
            response_type = %response.response_type,
            subject = %response.subject,
            "outbound response committed"
        );
    } else {
        tracing::info!("no primary outbound payload, committing inbound only");
    }

    patch.cumulative_extraction = Some(thread.cumulative_extraction);
    patch.workflow_completed = true;
    patch
}

/// Terminal node of the graph.
pub(crate) struct UpdateThreadNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for UpdateThreadNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        Ok(commit_turn(&self.ctx, state))
    }
}
