//! Conversation-stage assessment

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AgentResult, ConversationAssessment, ConversationRequest, ConversationStateAgent,
};

/// Derives the conversation stage from the stored history and the
/// inbound text.
pub struct ConversationStateAssessor;

#[async_trait]
impl ConversationStateAgent for ConversationStateAssessor {
    async fn process(
        &self,
        request: ConversationRequest<'_>,
    ) -> AgentResult<ConversationAssessment> {
        let text = format!("{} {}", request.subject, request.email_text).to_lowercase();
        let stage = if text.contains("confirm") {
            "customer_confirmation"
        } else if request.thread_history.is_empty() {
            "customer_initial_request"
        } else {
            "customer_followup"
        };

        Ok(ConversationAssessment {
            conversation_stage: stage.to_string(),
            latest_sender: "customer".to_string(),
            next_action: None,
            should_escalate: false,
            thread_context: serde_json::json!({
                "email_count": request.thread_history.len(),
                "has_cumulative_data": !request.cumulative_extraction.is_empty(),
            }),
        })
    }
}
