//! Response generation nodes and the mandatory-field gate
//!
//! The confirmation and confirmation-acknowledgment nodes run the
//! validator before invoking their generator; on missing fields the
//! generator is suppressed, the slot records the override, and a
//! clarification is produced instead. The acknowledgment response is
//! never gated.

use super::NodeContext;
use crate::adapters::{
    AcknowledgmentRequest, ClarificationRequest, ConfirmationAckRequest, ConfirmationRequest,
    ResponsePayload,
};
use crate::error::WorkflowResult;
use crate::extraction::{Extraction, ShipmentType};
use crate::graph::WorkflowNode;
use crate::state::{NodeSlot, SlotError, StatePatch, WorkflowState};
use crate::validator::{prioritize_missing_fields, validate_for_confirmation};
use async_trait::async_trait;
use std::sync::Arc;

/// The freshest merged extraction: reloaded from the thread store when
/// available, falling back to the state's cumulative record, then to the
/// per-email extraction.
fn latest_extraction(ctx: &NodeContext, state: &WorkflowState) -> Extraction {
    let stored = ctx.store.cumulative(&state.thread_id);
    if !stored.is_empty() {
        return stored;
    }
    state.effective_extraction()
}

/// Adjust an extraction for display: LCL clears the container fields,
/// FCL substitutes the standardized container type. The rate fallback
/// type is never displayed.
fn display_extraction(state: &WorkflowState, mut extracted: Extraction) -> Extraction {
    if extracted.shipment_details.shipment_type == Some(ShipmentType::Lcl) {
        extracted.shipment_details.container_type = None;
        extracted.shipment_details.container_count = None;
        return extracted;
    }
    if let Some(standardized) = state
        .container
        .as_ready()
        .and_then(|c| c.standardized_type.clone())
    {
        extracted.shipment_details.container_type = Some(standardized);
    }
    extracted
}

/// Run the clarification generator against the validator's missing list.
/// Shared by the clarification node and the two gated nodes.
async fn generate_clarification(
    ctx: &NodeContext,
    state: &WorkflowState,
) -> NodeSlot<ResponsePayload> {
    let extracted = display_extraction(state, latest_extraction(ctx, state));
    let (_, missing) = validate_for_confirmation(&extracted, state.port_lookup.as_ready());
    let missing = prioritize_missing_fields(&missing);

    let result = ctx
        .agents
        .clarification
        .process(ClarificationRequest {
            extracted_data: &extracted,
            missing_fields: &missing,
            customer_name: &state.email.first_name,
            agent_info: state.assigned_sales_person.as_ref(),
            port_lookup: state.port_lookup.as_ready(),
            container: state.container.as_ready(),
        })
        .await;

    if let Ok(payload) = &result {
        tracing::info!(subject = %payload.subject, "clarification response generated");
    }
    NodeSlot::from_result(result)
}

/// Generate the clarification response.
pub(crate) struct GenerateClarificationResponseNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for GenerateClarificationResponseNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        patch.clarification_response = generate_clarification(&self.ctx, state).await;
        Ok(patch)
    }
}

/// Generate the confirmation request, guarded by the mandatory-field
/// gate.
pub(crate) struct GenerateConfirmationResponseNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for GenerateConfirmationResponseNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = latest_extraction(&self.ctx, state);
        let (ok, missing) = validate_for_confirmation(&extracted, state.port_lookup.as_ready());

        if !ok {
            tracing::warn!(
                ?missing,
                "overriding confirmation to clarification, mandatory fields missing"
            );
            patch.confirmation_response = NodeSlot::Error(SlotError::gate(
                format!(
                    "Cannot generate confirmation - mandatory fields missing: {}",
                    missing.join(", ")
                ),
                missing,
                "Mandatory fields (Priority 1-3) are missing",
            ));
            patch.clarification_response = generate_clarification(&self.ctx, state).await;
            return Ok(patch);
        }

        let display = display_extraction(state, extracted);
        let result = self
            .ctx
            .agents
            .confirmation
            .process(ConfirmationRequest {
                extracted_data: &display,
                customer_name: &state.email.first_name,
                agent_info: state.assigned_sales_person.as_ref(),
                rate_info: state.rate_recommendation.as_ready(),
                container: state.container.as_ready(),
                port_lookup: state.port_lookup.as_ready(),
            })
            .await;

        if let Ok(payload) = &result {
            tracing::info!(subject = %payload.subject, "confirmation response generated");
        }
        patch.confirmation_response = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Generate the acknowledgment response for sales-person and forwarder
/// senders. Assigns a sales person on the fly when none was assigned.
pub(crate) struct GenerateAcknowledgmentResponseNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for GenerateAcknowledgmentResponseNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let default_details = serde_json::Value::Null;
        let (sender_type, sender_details) = state
            .classification
            .as_ready()
            .map(|c| {
                (
                    c.sender_classification.kind.as_str(),
                    &c.sender_classification.details,
                )
            })
            .unwrap_or(("customer", &default_details));

        let sales_person = match &state.assigned_sales_person {
            Some(person) => person.clone(),
            None => {
                let person = self.ctx.sales_team.assign_for_thread(&state.thread_id);
                tracing::info!(name = %person.name, "sales person assigned for acknowledgment");
                patch.assigned_sales_person = Some(person.clone());
                person
            }
        };

        let result = self
            .ctx
            .agents
            .acknowledgment
            .process(AcknowledgmentRequest {
                sender_type,
                sender_email: &state.email.sender,
                sender_details,
                email_content: &state.email.content,
                subject: &state.email.subject,
                thread_id: &state.thread_id,
                sales_person: &sales_person,
            })
            .await;

        if let Ok(payload) = &result {
            tracing::info!(subject = %payload.subject, sender_type, "acknowledgment generated");
        }
        patch.acknowledgment_response = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Generate the confirmation acknowledgment, guarded by the mandatory-
/// field gate even though the customer already confirmed.
pub(crate) struct GenerateConfirmationAcknowledgmentNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for GenerateConfirmationAcknowledgmentNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = latest_extraction(&self.ctx, state);
        let (ok, missing) = validate_for_confirmation(&extracted, state.port_lookup.as_ready());

        if !ok {
            tracing::warn!(
                ?missing,
                "customer confirmed but mandatory fields are missing, overriding to clarification"
            );
            patch.confirmation_acknowledgment = NodeSlot::Error(SlotError::gate(
                format!(
                    "Cannot proceed with confirmation acknowledgment - mandatory fields missing: {}",
                    missing.join(", ")
                ),
                missing,
                "Customer confirmed but mandatory fields (Priority 1-3) are missing",
            ));
            patch.clarification_response = generate_clarification(&self.ctx, state).await;
            return Ok(patch);
        }

        let display = display_extraction(state, extracted);
        let result = self
            .ctx
            .agents
            .confirmation_ack
            .process(ConfirmationAckRequest {
                extracted_data: &display,
                customer_name: &state.email.first_name,
                agent_info: state.assigned_sales_person.as_ref(),
                quote_timeline: &self.ctx.options.quote_timeline,
                port_lookup: state.port_lookup.as_ready(),
                container: state.container.as_ready(),
            })
            .await;

        if let Ok(payload) = &result {
            tracing::info!(subject = %payload.subject, "confirmation acknowledgment generated");
        }
        patch.confirmation_acknowledgment = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Generate the final customer quote once forwarder rates arrived.
pub(crate) struct GenerateCustomerQuoteNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for GenerateCustomerQuoteNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = latest_extraction(&self.ctx, state);
        let shipment = &extracted.shipment_details;

        let origin_raw = shipment.origin.as_deref().unwrap_or("N/A");
        let destination_raw = shipment.destination.as_deref().unwrap_or("N/A");
        let (origin, destination) = match state.port_lookup.as_ready() {
            Some(lookup) => (
                lookup.display_origin(origin_raw),
                lookup.display_destination(destination_raw),
            ),
            None => (origin_raw.to_string(), destination_raw.to_string()),
        };

        let rate_info = state
            .forwarder_response
            .as_ready()
            .map(|reply| reply.rate_info.clone())
            .unwrap_or_default();
        let sales_person = state
            .assigned_sales_person
            .clone()
            .unwrap_or_else(crate::sales_team::SalesPerson::default_specialist);

        let subject = format!("Shipping Quote - {} to {}", origin, destination);
        let mut body = format!(
            "Dear {},\n\nThank you for your patience. I'm pleased to provide you with the shipping quote for your shipment.\n\nShipment Details:\n- Origin: {}\n- Destination: {}\n",
            state.email.first_name, origin, destination
        );
        if let Some(container_type) = &shipment.container_type {
            body.push_str(&format!("- Container Type: {}\n", container_type));
        }
        if let Some(count) = &shipment.container_count {
            body.push_str(&format!("- Number of Containers: {}\n", count));
        }
        if let Some(commodity) = &shipment.commodity {
            body.push_str(&format!("- Commodity: {}\n", commodity));
        }
        if let Some(weight) = &shipment.weight {
            body.push_str(&format!("- Weight: {}\n", weight));
        }
        if let Some(volume) = &shipment.volume {
            body.push_str(&format!("- Volume: {}\n", volume));
        }
        if let Some(date) = extracted.effective_shipment_date() {
            body.push_str(&format!("- Ready Date: {}\n", date));
        }
        if let Some(incoterm) = &shipment.incoterm {
            body.push_str(&format!("- Incoterm: {}\n", incoterm));
        }

        body.push_str("\nRate Information:\n");
        if rate_info.has_rates() {
            let currency = rate_info.currency.as_deref().unwrap_or("USD");
            if let Some(rate) = &rate_info.rate {
                body.push_str(&format!("- Rate: {} {}\n", rate, currency));
            }
            if let Some(rate) = &rate_info.rate_with_othc {
                body.push_str(&format!("- Rate with Origin THC: {} {}\n", rate, currency));
            }
            if let Some(transit) = &rate_info.transit_time {
                body.push_str(&format!("- Transit Time: {} days\n", transit));
            }
            if let Some(valid_until) = &rate_info.valid_until {
                body.push_str(&format!("- Valid Until: {}\n", valid_until));
            }
            if let Some(sailing) = &rate_info.sailing_date {
                body.push_str(&format!("- Sailing Date: {}\n", sailing));
            }
        } else {
            body.push_str("- Rate information will be provided shortly.\n");
        }

        body.push_str(&format!(
            "\nPlease review the quote above and let me know if you'd like to proceed with the booking.\n\n{}\n",
            sales_person.signature
        ));

        tracing::info!(%subject, "customer quote generated");
        patch.customer_quote = NodeSlot::Ready(ResponsePayload {
            response_type: "customer_quote".to_string(),
            subject,
            body,
            missing_fields: Vec::new(),
        });
        Ok(patch)
    }
}
