//! Next-action determination

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AgentResult, NextAction, NextActionAgent, NextActionRequest,
};

/// Picks the next workflow action from the missing fields, the
/// conversation stage, and the sender classification.
pub struct NextActionDecider;

#[async_trait]
impl NextActionAgent for NextActionDecider {
    async fn process(&self, request: NextActionRequest<'_>) -> AgentResult<NextAction> {
        let sender_kind = request
            .classification
            .map(|c| c.sender_classification.kind.as_str())
            .unwrap_or("customer");
        let stage = request.conversation_stage.to_lowercase();

        let (action, reasoning) = if sender_kind == "forwarder" {
            (
                "assign_forwarder",
                "forwarder reply feeds the forwarder pipeline".to_string(),
            )
        } else if !request.missing_fields.is_empty() {
            (
                "send_clarification_request",
                format!("missing fields: {}", request.missing_fields.join(", ")),
            )
        } else if stage.contains("confirm") {
            (
                "send_acknowledgment",
                "customer confirmed with complete data".to_string(),
            )
        } else {
            (
                "send_confirmation_request",
                "all mandatory fields are present".to_string(),
            )
        };

        let confidence = if request.missing_fields.is_empty() {
            0.85
        } else {
            0.9
        };

        Ok(NextAction {
            action: action.to_string(),
            missing_fields: request.missing_fields.to_vec(),
            confidence,
            reasoning: Some(reasoning),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesflow_workflow_engine::adapters::EnrichedData;
    use salesflow_workflow_engine::extraction::Extraction;

    #[tokio::test]
    async fn missing_fields_force_clarification_action() {
        let extraction = Extraction::default();
        let missing = vec!["Origin".to_string()];
        let result = NextActionDecider
            .process(NextActionRequest {
                conversation_stage: "customer_initial_request",
                classification: None,
                extracted_data: &extraction,
                confidence_score: 0.8,
                validation: None,
                enriched: EnrichedData::default(),
                thread_id: "thread_1",
                missing_fields: &missing,
            })
            .await
            .unwrap();
        assert_eq!(result.action, "send_clarification_request");
        assert_eq!(result.missing_fields, missing);
    }

    #[tokio::test]
    async fn complete_data_requests_confirmation() {
        let extraction = Extraction::default();
        let result = NextActionDecider
            .process(NextActionRequest {
                conversation_stage: "customer_initial_request",
                classification: None,
                extracted_data: &extraction,
                confidence_score: 0.8,
                validation: None,
                enriched: EnrichedData::default(),
                thread_id: "thread_1",
                missing_fields: &[],
            })
            .await
            .unwrap();
        assert_eq!(result.action, "send_confirmation_request");
    }
}
