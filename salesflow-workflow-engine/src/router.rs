//! Routing decisions at the conditional edges of the workflow graph
//!
//! Every decision is a pure function over a read-only view of the state.
//! Escalation routing is removed from the happy path; unknown inputs fall
//! through to the customer flow.

use crate::graph::NodeId;
use crate::state::WorkflowState;
use crate::validator::validate_for_confirmation;

/// Confidence at or above which a turn is considered high-confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.7;
/// Confidence below which a turn is considered low-confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// After classification: sales people and forwarders get an
/// acknowledgment; customers and anything unrecognized enter the
/// conversation flow.
pub fn route_after_classification(state: &WorkflowState) -> NodeId {
    let sender_kind = state
        .classification
        .as_ready()
        .map(|c| c.sender_classification.kind.as_str())
        .unwrap_or("customer");

    match sender_kind {
        "sales_person" | "forwarder" => NodeId::GenerateAcknowledgmentResponse,
        _ => NodeId::ConversationState,
    }
}

/// After conversation-state analysis: always continue into thread
/// analysis.
pub fn route_after_conversation_state(_state: &WorkflowState) -> NodeId {
    NodeId::AnalyzeThread
}

/// After next-action determination: forwarder actions branch into
/// forwarder detection, every response action goes through sales-person
/// assignment first.
pub fn route_after_next_action(state: &WorkflowState) -> NodeId {
    let action = state
        .next_action
        .as_ready()
        .map(|n| n.action.as_str())
        .unwrap_or("send_confirmation_request");

    match action {
        "assign_forwarder" | "forwarder" => NodeId::DetectForwarder,
        _ => NodeId::AssignSalesPerson,
    }
}

/// The decision point after sales-person assignment.
///
/// The mandatory-field validator runs here against the merged extraction
/// and is the source of truth for missing fields; only when it reports
/// none is the next-action collaborator's list consulted. Priority:
/// clarification beats confirmation beats confirmation acknowledgment,
/// with clarification as the fallback.
pub fn route_after_sales_assignment(state: &WorkflowState) -> NodeId {
    let extracted = state.effective_extraction();
    let (_, validated_missing) =
        validate_for_confirmation(&extracted, state.port_lookup.as_ready());

    let missing = if !validated_missing.is_empty() {
        validated_missing
    } else {
        state
            .next_action
            .as_ready()
            .map(|n| n.missing_fields.clone())
            .unwrap_or_default()
    };

    let customer_confirmed = customer_confirmed(state);
    let overall_confidence = overall_confidence(state);
    tracing::debug!(
        missing = missing.len(),
        customer_confirmed,
        overall_confidence,
        "routing after sales assignment"
    );

    if !missing.is_empty() {
        return NodeId::GenerateClarificationResponse;
    }
    if !customer_confirmed {
        return NodeId::GenerateConfirmationResponse;
    }
    if customer_confirmed {
        return NodeId::GenerateConfirmationAcknowledgment;
    }
    // Low confidence or unknown state falls back to clarification.
    NodeId::GenerateClarificationResponse
}

/// True iff the conversation stage or the email type contains "confirm".
pub fn customer_confirmed(state: &WorkflowState) -> bool {
    let stage_confirms = state
        .conversation
        .as_ready()
        .map(|c| c.conversation_stage.to_lowercase().contains("confirm"))
        .unwrap_or(false);
    let type_confirms = state
        .classification
        .as_ready()
        .map(|c| c.email_type.to_lowercase().contains("confirm"))
        .unwrap_or(false);
    stage_confirms || type_confirms
}

/// Mean of the classification, extraction and validation confidences;
/// a failed contributor counts as zero.
pub fn overall_confidence(state: &WorkflowState) -> f64 {
    let classification = state
        .classification
        .as_ready()
        .map(|c| c.confidence)
        .unwrap_or(0.0);
    let extraction = state
        .extraction
        .as_ready()
        .map(|e| e.confidence)
        .unwrap_or(0.0);
    let validation = state
        .validation
        .as_ready()
        .map(|v| v.confidence)
        .unwrap_or(0.0);
    (classification + extraction + validation) / 3.0
}

/// After the acknowledgment response: forwarder senders continue into
/// forwarder-response processing; everyone else commits the turn.
pub fn route_after_acknowledgment(state: &WorkflowState) -> NodeId {
    let (sender_kind, email_type) = state
        .classification
        .as_ready()
        .map(|c| {
            (
                c.sender_classification.kind.as_str(),
                c.email_type.as_str(),
            )
        })
        .unwrap_or(("customer", ""));

    if sender_kind == "forwarder" || email_type == "forwarder_response" {
        return NodeId::ProcessForwarderResponse;
    }
    NodeId::UpdateThread
}

/// After the confirmation acknowledgment: assign forwarders only when
/// the acknowledgment succeeded and no clarification was generated in
/// its place by the mandatory-field gate.
pub fn route_after_confirmation_acknowledgment(state: &WorkflowState) -> NodeId {
    if state.clarification_response.is_ready() {
        tracing::debug!("gate produced a clarification, skipping forwarder assignment");
        return NodeId::UpdateThread;
    }
    if state.confirmation_acknowledgment.is_ready() {
        return NodeId::AssignForwarders;
    }
    NodeId::UpdateThread
}

/// After the sales notification: generate a customer quote when a
/// non-error forwarder response with actual rates exists.
pub fn route_after_sales_notification(state: &WorkflowState) -> NodeId {
    if let Some(reply) = state.forwarder_response.as_ready() {
        if reply.rate_info.has_rates() {
            return NodeId::GenerateCustomerQuote;
        }
    }
    NodeId::UpdateThread
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        Classification, ConversationAssessment, ExtractionOutcome, ForwarderReply, NextAction,
        RateInfo, ResponsePayload, SenderClassification, ValidationReport,
    };
    use crate::email::RawEmail;
    use crate::extraction::{Extraction, ShipmentDetails, ShipmentType};
    use crate::state::{NodeSlot, SlotError};
    use chrono::Utc;
    use serde_json::Value;
    use test_case::test_case;

    fn blank_state() -> WorkflowState {
        let email = RawEmail {
            sender: "customer@example.com".to_string(),
            subject: "Quote".to_string(),
            content: "body".to_string(),
            ..Default::default()
        }
        .normalize(Utc::now());
        WorkflowState::initial(email, "workflow_test".to_string(), Utc::now())
    }

    fn classification(kind: &str, email_type: &str) -> Classification {
        Classification {
            email_type: email_type.to_string(),
            sender_type: kind.to_string(),
            sender_classification: SenderClassification {
                kind: kind.to_string(),
                details: Value::Null,
                confidence: 0.9,
            },
            confidence: 0.9,
            escalation_needed: false,
            intent: None,
            reasoning: None,
        }
    }

    fn complete_fcl() -> Extraction {
        Extraction {
            shipment_details: ShipmentDetails {
                origin: Some("Shanghai".to_string()),
                destination: Some("Los Angeles".to_string()),
                container_type: Some("40HC".to_string()),
                container_count: Some("2".to_string()),
                commodity: Some("Electronics".to_string()),
                shipment_type: Some(ShipmentType::Fcl),
                shipment_date: Some("2024-03-15".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test_case("sales_person", NodeId::GenerateAcknowledgmentResponse; "sales person gets acknowledgment")]
    #[test_case("forwarder", NodeId::GenerateAcknowledgmentResponse; "forwarder gets acknowledgment")]
    #[test_case("customer", NodeId::ConversationState; "customer enters conversation flow")]
    #[test_case("martian", NodeId::ConversationState; "unrecognized tag enters conversation flow")]
    fn classification_routing(kind: &str, expected: NodeId) {
        let mut state = blank_state();
        state.classification = NodeSlot::Ready(classification(kind, "customer_inquiry"));
        assert_eq!(route_after_classification(&state), expected);
    }

    #[test]
    fn classification_error_routes_to_conversation_flow() {
        let mut state = blank_state();
        state.classification = NodeSlot::Error(SlotError::message("boom"));
        assert_eq!(
            route_after_classification(&state),
            NodeId::ConversationState
        );
    }

    #[test_case("send_clarification_request", NodeId::AssignSalesPerson)]
    #[test_case("clarification", NodeId::AssignSalesPerson)]
    #[test_case("send_confirmation_request", NodeId::AssignSalesPerson)]
    #[test_case("send_acknowledgment", NodeId::AssignSalesPerson)]
    #[test_case("assign_forwarder", NodeId::DetectForwarder)]
    #[test_case("forwarder", NodeId::DetectForwarder)]
    #[test_case("something_else", NodeId::AssignSalesPerson; "default goes through sales assignment")]
    fn next_action_routing(action: &str, expected: NodeId) {
        let mut state = blank_state();
        state.next_action = NodeSlot::Ready(NextAction {
            action: action.to_string(),
            missing_fields: Vec::new(),
            confidence: 0.9,
            reasoning: None,
        });
        assert_eq!(route_after_next_action(&state), expected);
    }

    #[test]
    fn missing_fields_force_clarification() {
        let mut state = blank_state();
        // Cumulative extraction is empty: everything is missing.
        assert_eq!(
            route_after_sales_assignment(&state),
            NodeId::GenerateClarificationResponse
        );

        // Even a customer confirmation does not bypass the gate.
        state.conversation = NodeSlot::Ready(ConversationAssessment {
            conversation_stage: "customer_confirmation".to_string(),
            latest_sender: "customer".to_string(),
            next_action: None,
            should_escalate: false,
            thread_context: Value::Null,
        });
        assert_eq!(
            route_after_sales_assignment(&state),
            NodeId::GenerateClarificationResponse
        );
    }

    #[test]
    fn complete_unconfirmed_gets_confirmation_request() {
        let mut state = blank_state();
        state.cumulative_extraction = complete_fcl();
        assert_eq!(
            route_after_sales_assignment(&state),
            NodeId::GenerateConfirmationResponse
        );
    }

    #[test]
    fn complete_confirmed_gets_confirmation_acknowledgment() {
        let mut state = blank_state();
        state.cumulative_extraction = complete_fcl();
        state.classification = NodeSlot::Ready(classification("customer", "customer_confirmation"));
        assert_eq!(
            route_after_sales_assignment(&state),
            NodeId::GenerateConfirmationAcknowledgment
        );
    }

    #[test]
    fn overall_confidence_counts_failed_slots_as_zero() {
        let mut state = blank_state();
        state.classification = NodeSlot::Ready(classification("customer", "customer_inquiry"));
        state.extraction = NodeSlot::Ready(ExtractionOutcome {
            extracted_data: Extraction::default(),
            quality_score: 0.5,
            confidence: 0.6,
        });
        state.validation = NodeSlot::Error(SlotError::message("unavailable"));
        let confidence = overall_confidence(&state);
        assert!((confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn forwarder_sender_continues_into_forwarder_processing() {
        let mut state = blank_state();
        state.classification = NodeSlot::Ready(classification("forwarder", "forwarder_response"));
        assert_eq!(
            route_after_acknowledgment(&state),
            NodeId::ProcessForwarderResponse
        );

        state.classification = NodeSlot::Ready(classification("sales_person", "sales_update"));
        assert_eq!(route_after_acknowledgment(&state), NodeId::UpdateThread);
    }

    #[test]
    fn ack_success_assigns_forwarders() {
        let mut state = blank_state();
        state.confirmation_acknowledgment = NodeSlot::Ready(ResponsePayload {
            response_type: "confirmation_acknowledgment".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            missing_fields: Vec::new(),
        });
        assert_eq!(
            route_after_confirmation_acknowledgment(&state),
            NodeId::AssignForwarders
        );
    }

    #[test]
    fn gate_override_skips_forwarder_assignment() {
        let mut state = blank_state();
        state.confirmation_acknowledgment = NodeSlot::Error(SlotError::gate(
            "mandatory fields missing: Shipment Date",
            vec!["Shipment Date".to_string()],
            "Customer confirmed but mandatory fields are missing",
        ));
        state.clarification_response = NodeSlot::Ready(ResponsePayload {
            response_type: "clarification".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            missing_fields: vec!["Shipment Date".to_string()],
        });
        assert_eq!(
            route_after_confirmation_acknowledgment(&state),
            NodeId::UpdateThread
        );
    }

    #[test]
    fn rates_present_leads_to_customer_quote() {
        let mut state = blank_state();
        state.forwarder_response = NodeSlot::Ready(ForwarderReply {
            forwarder_name: "Pacific Bridge Logistics".to_string(),
            forwarder_email: "rates@pacificbridge.example".to_string(),
            rate_info: RateInfo {
                rate: Some("2450".to_string()),
                currency: Some("USD".to_string()),
                ..Default::default()
            },
        });
        assert_eq!(
            route_after_sales_notification(&state),
            NodeId::GenerateCustomerQuote
        );
    }

    #[test]
    fn no_rates_commits_turn_after_notification() {
        let mut state = blank_state();
        state.forwarder_response = NodeSlot::Ready(ForwarderReply {
            forwarder_name: "Pacific Bridge Logistics".to_string(),
            forwarder_email: "rates@pacificbridge.example".to_string(),
            rate_info: RateInfo::default(),
        });
        assert_eq!(route_after_sales_notification(&state), NodeId::UpdateThread);

        let mut state = blank_state();
        state.forwarder_response = NodeSlot::Error(SlotError::message("parse failed"));
        assert_eq!(route_after_sales_notification(&state), NodeId::UpdateThread);
    }

    #[test]
    fn validator_report_used_for_routing_confidence() {
        let mut state = blank_state();
        state.cumulative_extraction = complete_fcl();
        state.validation = NodeSlot::Ready(ValidationReport {
            validation_status: "complete".to_string(),
            confidence: 0.9,
        });
        // The validator slot only contributes confidence; the route is
        // still decided by the mandatory-field validation.
        assert_eq!(
            route_after_sales_assignment(&state),
            NodeId::GenerateConfirmationResponse
        );
    }
}
