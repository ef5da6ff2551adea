//! Forwarder handling nodes: detection, reply processing, assignment,
//! and the sales notification

use super::NodeContext;
use crate::adapters::{
    ForwarderDetectRequest, ForwarderDraftRequest, ForwarderReplyRequest, RateInfo,
    SalesNotifyRequest,
};
use crate::error::WorkflowResult;
use crate::graph::WorkflowNode;
use crate::state::{ForwarderAssignment, NodeSlot, StatePatch, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;

/// Detect whether the inbound email comes from a registered forwarder.
pub(crate) struct DetectForwarderNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for DetectForwarderNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let result = self
            .ctx
            .agents
            .forwarder_detector
            .process(ForwarderDetectRequest {
                sender: &state.email.sender,
                email_text: &state.email.content,
                registry: &self.ctx.forwarders,
            })
            .await;

        match result {
            Ok(detection) => {
                patch.is_forwarder_email = Some(detection.is_forwarder);
                patch.forwarder_detection = NodeSlot::Ready(detection);
            }
            Err(error) => {
                tracing::error!(%error, "forwarder detection failed");
                patch.is_forwarder_email = Some(false);
                patch.forwarder_detection =
                    NodeSlot::Error(crate::state::SlotError::message(error.0));
            }
        }
        Ok(patch)
    }
}

/// Process a forwarder's rate reply.
pub(crate) struct ProcessForwarderResponseNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for ProcessForwarderResponseNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = state
            .extraction
            .as_ready()
            .map(|o| o.extracted_data.clone())
            .unwrap_or_default();
        let result = self
            .ctx
            .agents
            .forwarder_reply
            .process(ForwarderReplyRequest {
                sender: &state.email.sender,
                email_text: &state.email.content,
                forwarder_info: state.forwarder_detection.as_ready(),
                extracted_data: &extracted,
            })
            .await;

        if let Ok(reply) = &result {
            tracing::info!(
                forwarder = %reply.forwarder_name,
                has_rates = reply.rate_info.has_rates(),
                "forwarder response processed"
            );
        }
        patch.forwarder_response = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Assign a forwarder for the confirmed route and draft the rate-request
/// email. A route no forwarder covers yields a deterministic
/// no-forwarder record; the turn still commits.
pub(crate) struct AssignForwardersNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for AssignForwardersNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = state.effective_extraction();
        let mut shipment = extracted.shipment_details.clone();

        // Drafts carry the standardized container type and fall back to
        // the requested dates for the shipment date.
        if let Some(standardized) = state
            .container
            .as_ready()
            .and_then(|c| c.standardized_type.clone())
        {
            shipment.container_type = Some(standardized);
        }
        if shipment.shipment_date.is_none() {
            shipment.shipment_date = extracted.timeline_information.requested_dates.clone();
        }

        let origin_country = resolve_country(
            shipment.origin_country.as_deref(),
            state
                .port_lookup
                .as_ready()
                .and_then(|p| p.origin.as_ref())
                .and_then(|i| i.country.as_deref()),
            shipment.origin.as_deref(),
        );
        let destination_country = resolve_country(
            shipment.destination_country.as_deref(),
            state
                .port_lookup
                .as_ready()
                .and_then(|p| p.destination.as_ref())
                .and_then(|i| i.country.as_deref()),
            shipment.destination.as_deref(),
        );

        let Some(forwarder) = self
            .ctx
            .forwarders
            .assign_for_route(&origin_country, &destination_country)
        else {
            patch.forwarder_assignment = NodeSlot::Ready(ForwarderAssignment::no_forwarder(
                origin_country,
                destination_country,
            ));
            return Ok(patch);
        };
        let forwarder = forwarder.clone();

        let draft = self
            .ctx
            .agents
            .forwarder_draft
            .process(ForwarderDraftRequest {
                forwarder: &forwarder,
                shipment_details: &shipment,
                origin_country: &origin_country,
                destination_country: &destination_country,
                port_lookup: state.port_lookup.as_ready(),
                thread_id: &state.thread_id,
                sales_person: state.assigned_sales_person.as_ref(),
                customer_email_content: &state.email.content,
            })
            .await;
        let rate_request = match draft {
            Ok(draft) => Some(draft),
            Err(error) => {
                tracing::warn!(%error, "rate request draft failed");
                None
            }
        };

        tracing::info!(
            forwarder = %forwarder.name,
            route = %format!("{} -> {}", origin_country, destination_country),
            "forwarder assigned"
        );
        patch.forwarder_assignment = NodeSlot::Ready(ForwarderAssignment {
            status: "success".to_string(),
            assigned_forwarder: Some(forwarder),
            origin_country,
            destination_country,
            rate_request,
            assignment_method: "country_based".to_string(),
        });
        Ok(patch)
    }
}

/// Country for one leg of the route: the extracted country field first,
/// the port lookup's country second, the raw location name last.
fn resolve_country(
    extracted: Option<&str>,
    port_country: Option<&str>,
    location: Option<&str>,
) -> String {
    extracted
        .or(port_country)
        .or(location)
        .unwrap_or_default()
        .to_string()
}

/// Notify the sales team; collates forwarder rates when present.
pub(crate) struct NotifySalesNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for NotifySalesNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = state.effective_extraction();

        let reply = state.forwarder_response.as_ready();
        let notification_type = if reply.is_some() {
            "rates_received"
        } else {
            "deal_update"
        };
        let forwarder_rates: Vec<RateInfo> = reply
            .filter(|r| r.rate_info.has_rates())
            .map(|r| vec![r.rate_info.clone()])
            .unwrap_or_default();

        let forwarder_details = forwarder_details(state);
        let conversation_state = state
            .conversation
            .as_ready()
            .map(|c| c.conversation_stage.as_str())
            .unwrap_or("unknown");
        let urgency = if reply.is_some() { "high" } else { "medium" };

        let result = self
            .ctx
            .agents
            .sales_notifier
            .process(SalesNotifyRequest {
                notification_type,
                customer_details: &extracted.contact_information,
                shipment_details: &extracted.shipment_details,
                forwarder_rates: &forwarder_rates,
                forwarder_details: &forwarder_details,
                timeline_information: &extracted.timeline_information,
                conversation_state,
                thread_id: &state.thread_id,
                urgency,
            })
            .await;

        if let Ok(notification) = &result {
            tracing::info!(
                notification_type = %notification.notification_type,
                "sales team notified"
            );
        }
        patch.sales_notification = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Forwarder identity for the notification: the processed reply first,
/// the detection result second, the sender address last.
fn forwarder_details(state: &WorkflowState) -> serde_json::Value {
    if let Some(reply) = state.forwarder_response.as_ready() {
        return serde_json::json!({
            "name": reply.forwarder_name,
            "email": reply.forwarder_email,
            "company": reply.forwarder_name,
        });
    }
    if let Some(detection) = state.forwarder_detection.as_ready() {
        if let Some(forwarder) = &detection.forwarder {
            return serde_json::json!({
                "name": forwarder.name,
                "email": forwarder.email,
                "company": forwarder.company_name(),
            });
        }
    }
    serde_json::json!({
        "name": "Forwarder",
        "email": state.email.sender,
        "company": "Forwarder",
    })
}
