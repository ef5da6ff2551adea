//! Ingestion nodes: classification, conversation state, thread analysis,
//! extraction, and the cumulative-extraction update

use super::NodeContext;
use crate::adapters::{
    ClassifyRequest, ConversationRequest, ExtractRequest, ThreadAnalysisRequest,
};
use crate::error::WorkflowResult;
use crate::graph::WorkflowNode;
use crate::merge::merge_with_recency_priority;
use crate::state::{NodeSlot, SlotError, StatePatch, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;

/// Step 1: classify the inbound email.
pub(crate) struct ClassifyEmailNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for ClassifyEmailNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        if state.email.is_empty() {
            tracing::error!("email content is missing");
            patch.classification = NodeSlot::Error(SlotError::message("Email content is missing"));
            patch.should_escalate = true;
            return Ok(patch);
        }

        let result = self
            .ctx
            .agents
            .classifier
            .process(ClassifyRequest {
                email_text: &state.email.content,
                subject: &state.email.subject,
                sender: &state.email.sender,
                thread_id: &state.thread_id,
                thread_history: &state.thread_history,
            })
            .await;

        if let Ok(classification) = &result {
            tracing::info!(
                email_type = %classification.email_type,
                sender_type = %classification.sender_type,
                confidence = classification.confidence,
                "email classified"
            );
        }
        patch.classification = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Step 2: assess the conversation state of the thread.
pub(crate) struct ConversationStateNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for ConversationStateNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let result = self
            .ctx
            .agents
            .conversation
            .process(ConversationRequest {
                email_text: &state.email.content,
                subject: &state.email.subject,
                thread_id: &state.thread_id,
                thread_history: &state.thread_history,
                cumulative_extraction: &state.cumulative_extraction,
                customer_context: &state.customer_context,
                forwarder_context: &state.forwarder_context,
            })
            .await;

        match result {
            Ok(assessment) => {
                tracing::info!(stage = %assessment.conversation_stage, "conversation state assessed");
                patch.should_escalate = assessment.should_escalate;
                patch.conversation = NodeSlot::Ready(assessment);
            }
            Err(error) => {
                tracing::error!(%error, "conversation state analysis failed");
                patch.conversation = NodeSlot::Error(SlotError::message(error.0));
                patch.should_escalate = true;
            }
        }
        Ok(patch)
    }
}

/// Step 3: analyze the thread context.
pub(crate) struct AnalyzeThreadNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for AnalyzeThreadNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let result = self
            .ctx
            .agents
            .thread_analyzer
            .process(ThreadAnalysisRequest {
                email_text: &state.email.content,
                subject: &state.email.subject,
                sender: &state.email.sender,
                thread_id: &state.thread_id,
                thread_history: &state.thread_history,
                previous_classifications: &[],
                customer_context: &state.customer_context,
                forwarder_context: &state.forwarder_context,
            })
            .await;
        patch.thread_analysis = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Step 4: extract structured information from the email.
pub(crate) struct ExtractInformationNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for ExtractInformationNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let result = self
            .ctx
            .agents
            .extractor
            .process(ExtractRequest {
                email_text: &state.email.content,
                sender: &state.email.sender,
                subject: &state.email.subject,
                thread_id: &state.thread_id,
                timestamp: state.timestamp,
                customer_context: &state.customer_context,
                forwarder_context: &state.forwarder_context,
                prioritize_recent: true,
                cumulative_extraction: &state.cumulative_extraction,
            })
            .await;

        if let Ok(outcome) = &result {
            tracing::info!(
                quality = outcome.quality_score,
                confidence = outcome.confidence,
                "information extracted"
            );
        }
        patch.extraction = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Step 4.5: fold the fresh extraction into the cumulative record and
/// persist it. An absent extraction is the identity.
pub(crate) struct UpdateCumulativeExtractionNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for UpdateCumulativeExtractionNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let Some(outcome) = state.extraction.as_ready() else {
            tracing::warn!("no new extraction data to merge");
            return Ok(patch);
        };
        if outcome.extracted_data.is_empty() {
            tracing::warn!("extraction is empty, cumulative record unchanged");
            return Ok(patch);
        }

        let merged =
            merge_with_recency_priority(&outcome.extracted_data, &state.cumulative_extraction);
        if !self
            .ctx
            .store
            .update_cumulative(&state.thread_id, &outcome.extracted_data)
        {
            tracing::warn!(thread_id = %state.thread_id, "cumulative extraction not persisted");
        }
        patch.cumulative_extraction = Some(merged);
        Ok(patch)
    }
}
