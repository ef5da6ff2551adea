//! Per-turn workflow state, node result slots, and patch application
//!
//! Nodes never mutate the state directly: each node returns a
//! [`StatePatch`] and the graph engine applies it field by field. Slots
//! declared with a reducer are merged by that reducer instead of being
//! overwritten.

use crate::adapters::{
    Classification, ContainerStandardization, ConversationAssessment, ExtractionOutcome,
    ForwarderDetection, ForwarderReply, NextAction, PortLookupOutcome, RateRecommendation,
    RateRequestDraft, ResponsePayload, SalesNotification, ValidationReport,
};
use crate::extraction::Extraction;
use crate::email::InboundEmail;
use crate::forwarder::Forwarder;
use crate::sales_team::SalesPerson;
use crate::thread_store::EmailEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured error recorded in a node's slot.
///
/// The mandatory-field gate attaches the missing fields and the override
/// reason so downstream routing and the caller can see why a generator
/// was suppressed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotError {
    pub error: String,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub override_reason: Option<String>,
}

impl SlotError {
    pub fn message(error: impl Into<String>) -> Self {
        SlotError {
            error: error.into(),
            ..Default::default()
        }
    }

    pub fn gate(error: impl Into<String>, missing: Vec<String>, reason: impl Into<String>) -> Self {
        SlotError {
            error: error.into(),
            missing_fields: missing,
            override_reason: Some(reason.into()),
        }
    }
}

/// A node result slot: absent, an error payload, or a ready payload.
///
/// The explicit `Unset` state makes the "first non-null wins" reducer
/// well-defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeSlot<T> {
    Unset,
    Error(SlotError),
    Ready(T),
}

impl<T> Default for NodeSlot<T> {
    fn default() -> Self {
        NodeSlot::Unset
    }
}

impl<T> NodeSlot<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, NodeSlot::Unset)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, NodeSlot::Ready(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NodeSlot::Error(_))
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            NodeSlot::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&SlotError> {
        match self {
            NodeSlot::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Wrap an adapter result: `Err` is coerced into the error variant.
    pub fn from_result(result: Result<T, crate::adapters::AgentError>) -> Self {
        match result {
            Ok(value) => NodeSlot::Ready(value),
            Err(error) => NodeSlot::Error(SlotError::message(error.0)),
        }
    }
}

/// Turn-local workflow state.
///
/// Shared inputs are set once at turn start; result slots are written by
/// exactly one node each (the reducers protect the three exceptions);
/// control flags steer routing.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    // Shared inputs
    pub email: InboundEmail,
    pub thread_history: Vec<EmailEntry>,
    pub customer_context: Value,
    pub forwarder_context: Value,
    pub market_data: Value,
    pub cumulative_extraction: Extraction,
    pub thread_id: String,
    pub workflow_id: String,
    pub timestamp: DateTime<Utc>,

    // Node result slots
    pub classification: NodeSlot<Classification>,
    pub conversation: NodeSlot<ConversationAssessment>,
    pub thread_analysis: NodeSlot<Value>,
    pub extraction: NodeSlot<ExtractionOutcome>,
    pub validation: NodeSlot<ValidationReport>,
    pub port_lookup: NodeSlot<PortLookupOutcome>,
    pub container: NodeSlot<ContainerStandardization>,
    pub rate_recommendation: NodeSlot<RateRecommendation>,
    pub next_action: NodeSlot<NextAction>,

    // Response slots
    pub clarification_response: NodeSlot<ResponsePayload>,
    pub confirmation_response: NodeSlot<ResponsePayload>,
    pub acknowledgment_response: NodeSlot<ResponsePayload>,
    pub confirmation_acknowledgment: NodeSlot<ResponsePayload>,
    pub customer_quote: NodeSlot<ResponsePayload>,

    // Forwarder handling
    pub forwarder_detection: NodeSlot<ForwarderDetection>,
    /// Reducer: first non-null wins
    pub forwarder_response: NodeSlot<ForwarderReply>,
    pub forwarder_assignment: NodeSlot<ForwarderAssignment>,

    // Escalation and notifications (reducers: first non-null wins)
    pub escalation: NodeSlot<Value>,
    pub sales_notification: NodeSlot<SalesNotification>,

    // Control flags
    /// Reducer: logical OR
    pub should_escalate: bool,
    pub is_forwarder_email: bool,
    pub workflow_completed: bool,
    pub assigned_sales_person: Option<SalesPerson>,
}

impl WorkflowState {
    /// Fresh state at the start of a turn. Thread history, contexts and
    /// the cumulative extraction are filled in by the orchestrator when
    /// the thread already exists.
    pub fn initial(email: InboundEmail, workflow_id: String, timestamp: DateTime<Utc>) -> Self {
        let thread_id = email.thread_id.clone();
        WorkflowState {
            email,
            thread_history: Vec::new(),
            customer_context: Value::Object(Default::default()),
            forwarder_context: Value::Object(Default::default()),
            market_data: Value::Object(Default::default()),
            cumulative_extraction: Extraction::default(),
            thread_id,
            workflow_id,
            timestamp,
            classification: NodeSlot::Unset,
            conversation: NodeSlot::Unset,
            thread_analysis: NodeSlot::Unset,
            extraction: NodeSlot::Unset,
            validation: NodeSlot::Unset,
            port_lookup: NodeSlot::Unset,
            container: NodeSlot::Unset,
            rate_recommendation: NodeSlot::Unset,
            next_action: NodeSlot::Unset,
            clarification_response: NodeSlot::Unset,
            confirmation_response: NodeSlot::Unset,
            acknowledgment_response: NodeSlot::Unset,
            confirmation_acknowledgment: NodeSlot::Unset,
            customer_quote: NodeSlot::Unset,
            forwarder_detection: NodeSlot::Unset,
            forwarder_response: NodeSlot::Unset,
            forwarder_assignment: NodeSlot::Unset,
            escalation: NodeSlot::Unset,
            sales_notification: NodeSlot::Unset,
            should_escalate: false,
            is_forwarder_email: false,
            workflow_completed: false,
            assigned_sales_person: None,
        }
    }

    /// The merged extraction to act on: cumulative when it has content,
    /// otherwise the per-email extraction of this turn.
    pub fn effective_extraction(&self) -> Extraction {
        if !self.cumulative_extraction.is_empty() {
            return self.cumulative_extraction.clone();
        }
        self.extraction
            .as_ready()
            .map(|outcome| outcome.extracted_data.clone())
            .unwrap_or_default()
    }
}

/// Result of forwarder assignment after a confirmation acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwarderAssignment {
    pub status: String,
    #[serde(default)]
    pub assigned_forwarder: Option<Forwarder>,
    pub origin_country: String,
    pub destination_country: String,
    #[serde(default)]
    pub rate_request: Option<RateRequestDraft>,
    pub assignment_method: String,
}

impl ForwarderAssignment {
    /// Deterministic record for a route no forwarder covers.
    pub fn no_forwarder(origin_country: String, destination_country: String) -> Self {
        ForwarderAssignment {
            status: "no_forwarder_available".to_string(),
            assigned_forwarder: None,
            origin_country,
            destination_country,
            rate_request: None,
            assignment_method: "country_based".to_string(),
        }
    }
}

/// Patch returned by one node. `Unset` slots mean "no write"; flags use
/// their reducer semantics on application.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub classification: NodeSlot<Classification>,
    pub conversation: NodeSlot<ConversationAssessment>,
    pub thread_analysis: NodeSlot<Value>,
    pub extraction: NodeSlot<ExtractionOutcome>,
    pub validation: NodeSlot<ValidationReport>,
    pub port_lookup: NodeSlot<PortLookupOutcome>,
    pub container: NodeSlot<ContainerStandardization>,
    pub rate_recommendation: NodeSlot<RateRecommendation>,
    pub next_action: NodeSlot<NextAction>,
    pub clarification_response: NodeSlot<ResponsePayload>,
    pub confirmation_response: NodeSlot<ResponsePayload>,
    pub acknowledgment_response: NodeSlot<ResponsePayload>,
    pub confirmation_acknowledgment: NodeSlot<ResponsePayload>,
    pub customer_quote: NodeSlot<ResponsePayload>,
    pub forwarder_detection: NodeSlot<ForwarderDetection>,
    pub forwarder_response: NodeSlot<ForwarderReply>,
    pub forwarder_assignment: NodeSlot<ForwarderAssignment>,
    pub escalation: NodeSlot<Value>,
    pub sales_notification: NodeSlot<SalesNotification>,
    pub cumulative_extraction: Option<Extraction>,
    pub assigned_sales_person: Option<SalesPerson>,
    pub should_escalate: bool,
    pub is_forwarder_email: Option<bool>,
    pub workflow_completed: bool,
}

fn write<T>(target: &mut NodeSlot<T>, patch: NodeSlot<T>) {
    if !patch.is_unset() {
        *target = patch;
    }
}

/// First-non-null reducer: an already-set slot is never replaced.
fn reduce_first<T>(target: &mut NodeSlot<T>, patch: NodeSlot<T>) {
    if target.is_unset() && !patch.is_unset() {
        *target = patch;
    }
}

impl StatePatch {
    /// Apply the patch to the state, honoring the reducer fields.
    pub fn apply(self, state: &mut WorkflowState) {
        write(&mut state.classification, self.classification);
        write(&mut state.conversation, self.conversation);
        write(&mut state.thread_analysis, self.thread_analysis);
        write(&mut state.extraction, self.extraction);
        write(&mut state.validation, self.validation);
        write(&mut state.port_lookup, self.port_lookup);
        write(&mut state.container, self.container);
        write(&mut state.rate_recommendation, self.rate_recommendation);
        write(&mut state.next_action, self.next_action);
        write(&mut state.clarification_response, self.clarification_response);
        write(&mut state.confirmation_response, self.confirmation_response);
        write(&mut state.acknowledgment_response, self.acknowledgment_response);
        write(
            &mut state.confirmation_acknowledgment,
            self.confirmation_acknowledgment,
        );
        write(&mut state.customer_quote, self.customer_quote);
        write(&mut state.forwarder_detection, self.forwarder_detection);
        write(&mut state.forwarder_assignment, self.forwarder_assignment);

        // Reducer fields: first non-null wins.
        reduce_first(&mut state.forwarder_response, self.forwarder_response);
        reduce_first(&mut state.escalation, self.escalation);
        reduce_first(&mut state.sales_notification, self.sales_notification);

        if let Some(cumulative) = self.cumulative_extraction {
            state.cumulative_extraction = cumulative;
        }
        if let Some(person) = self.assigned_sales_person {
            state.assigned_sales_person = Some(person);
        }
        // Reducer: logical OR.
        state.should_escalate |= self.should_escalate;
        state.workflow_completed |= self.workflow_completed;
        if let Some(flag) = self.is_forwarder_email {
            state.is_forwarder_email = flag;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::RawEmail;

    fn state() -> WorkflowState {
        let email = RawEmail {
            sender: "customer@example.com".to_string(),
            subject: "Quote".to_string(),
            content: "body".to_string(),
            ..Default::default()
        }
        .normalize(Utc::now());
        WorkflowState::initial(email, "workflow_test".to_string(), Utc::now())
    }

    #[test]
    fn first_non_null_reducer_keeps_first_write() {
        let mut s = state();
        let mut patch = StatePatch::default();
        patch.escalation = NodeSlot::Ready(serde_json::json!({"writer": "first"}));
        patch.apply(&mut s);

        let mut second = StatePatch::default();
        second.escalation = NodeSlot::Ready(serde_json::json!({"writer": "second"}));
        second.apply(&mut s);

        assert_eq!(
            s.escalation.as_ready().unwrap()["writer"],
            Value::from("first")
        );
    }

    #[test]
    fn should_escalate_is_or_reduced() {
        let mut s = state();
        let mut patch = StatePatch::default();
        patch.should_escalate = true;
        patch.apply(&mut s);
        assert!(s.should_escalate);

        let unset = StatePatch::default();
        unset.apply(&mut s);
        assert!(s.should_escalate, "a later false must not clear the flag");
    }

    #[test]
    fn last_write_wins_for_ordinary_slots() {
        let mut s = state();
        let mut patch = StatePatch::default();
        patch.thread_analysis = NodeSlot::Ready(serde_json::json!(1));
        patch.apply(&mut s);

        let mut second = StatePatch::default();
        second.thread_analysis = NodeSlot::Ready(serde_json::json!(2));
        second.apply(&mut s);

        assert_eq!(s.thread_analysis.as_ready().unwrap(), &serde_json::json!(2));
    }

    #[test]
    fn unset_patch_slot_is_no_write() {
        let mut s = state();
        let mut patch = StatePatch::default();
        patch.thread_analysis = NodeSlot::Ready(serde_json::json!(1));
        patch.apply(&mut s);

        StatePatch::default().apply(&mut s);
        assert!(s.thread_analysis.is_ready());
    }

    #[test]
    fn effective_extraction_prefers_cumulative() {
        let mut s = state();
        s.cumulative_extraction.shipment_details.origin = Some("Shanghai".to_string());
        let mut per_email = Extraction::default();
        per_email.shipment_details.origin = Some("Ningbo".to_string());
        s.extraction = NodeSlot::Ready(ExtractionOutcome {
            extracted_data: per_email,
            quality_score: 1.0,
            confidence: 1.0,
        });
        assert_eq!(
            s.effective_extraction().shipment_details.origin.as_deref(),
            Some("Shanghai")
        );
    }
}
