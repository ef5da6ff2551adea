//! Enrichment nodes: validation, port lookup, container standardization,
//! rate recommendation, next action, and sales-person assignment

use super::NodeContext;
use crate::adapters::{
    ContainerRequest, ContainerStandardization, EnrichedData, NextActionRequest, PortCodes,
    PortLookupOutcome, RateRecommendation, RateRequest, ValidateRequest,
};
use crate::error::WorkflowResult;
use crate::extraction::ShipmentType;
use crate::graph::WorkflowNode;
use crate::state::{NodeSlot, StatePatch, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;

/// Step 5: validate the extracted data.
pub(crate) struct ValidateDataNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for ValidateDataNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = state
            .extraction
            .as_ready()
            .map(|outcome| outcome.extracted_data.clone())
            .unwrap_or_default();
        let rules = serde_json::Value::Object(Default::default());
        let result = self
            .ctx
            .agents
            .validator
            .process(ValidateRequest {
                extracted_data: &extracted,
                validation_rules: &rules,
            })
            .await;
        patch.validation = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Step 6: look up the origin and destination ports.
///
/// The lookup prefers the cumulative extraction; a failed per-port call
/// degrades to "no lookup" for that leg.
pub(crate) struct LookupPortsNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for LookupPortsNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let shipment = state.effective_extraction().shipment_details;

        let mut outcome = PortLookupOutcome::default();
        if let Some(origin) = &shipment.origin {
            match self.ctx.agents.port_lookup.lookup(origin).await {
                Ok(info) => outcome.origin = Some(info),
                Err(error) => tracing::warn!(%error, port = %origin, "origin port lookup failed"),
            }
        }
        if let Some(destination) = &shipment.destination {
            match self.ctx.agents.port_lookup.lookup(destination).await {
                Ok(info) => outcome.destination = Some(info),
                Err(error) => {
                    tracing::warn!(%error, port = %destination, "destination port lookup failed")
                }
            }
        }
        outcome.port_codes = PortCodes {
            origin: outcome.origin.as_ref().and_then(|i| i.port_code.clone()),
            destination: outcome
                .destination
                .as_ref()
                .and_then(|i| i.port_code.clone()),
        };
        tracing::info!(
            origin_code = outcome.port_codes.origin.as_deref().unwrap_or("-"),
            destination_code = outcome.port_codes.destination.as_deref().unwrap_or("-"),
            "port lookup completed"
        );
        patch.port_lookup = NodeSlot::Ready(outcome);
        Ok(patch)
    }
}

/// Step 7: standardize the container type. Skipped for LCL shipments and
/// when no container type was stated.
pub(crate) struct StandardizeContainerNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for StandardizeContainerNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let shipment = state.effective_extraction().shipment_details;

        if shipment.shipment_type == Some(ShipmentType::Lcl) {
            tracing::info!("skipping container standardization for LCL shipment");
            patch.container = NodeSlot::Ready(ContainerStandardization {
                standardized_type: None,
                rate_fallback_type: None,
                reason: Some("LCL shipment - container standardization not applicable".to_string()),
            });
            return Ok(patch);
        }

        let Some(container_type) = shipment.container_type.as_deref() else {
            tracing::info!("no container type to standardize");
            patch.container = NodeSlot::Ready(ContainerStandardization {
                standardized_type: None,
                rate_fallback_type: None,
                reason: Some("No container type provided".to_string()),
            });
            return Ok(patch);
        };

        let result = self
            .ctx
            .agents
            .container
            .process(ContainerRequest {
                container_type,
                container_count: shipment.container_count.as_deref(),
            })
            .await;
        patch.container = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Step 8: recommend rates. FCL only; LCL shipments skip the market
/// lookup entirely.
pub(crate) struct RecommendRatesNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for RecommendRatesNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let mut shipment = state.effective_extraction().shipment_details;

        if shipment.container_type.is_none() {
            tracing::info!("skipping rate recommendation for LCL shipment");
            patch.rate_recommendation = NodeSlot::Ready(RateRecommendation {
                status: "skipped".to_string(),
                reason: Some("LCL shipment - rate recommendation not applicable".to_string()),
                ..Default::default()
            });
            return Ok(patch);
        }

        // Rates are quoted against the standardized container type.
        if let Some(standardized) = state
            .container
            .as_ready()
            .and_then(|c| c.standardized_type.clone())
        {
            shipment.container_type = Some(standardized);
        }

        let default_codes = PortCodes::default();
        let port_codes = state
            .port_lookup
            .as_ready()
            .map(|p| &p.port_codes)
            .unwrap_or(&default_codes);

        let result = self
            .ctx
            .agents
            .rates
            .process(RateRequest {
                shipment_details: &shipment,
                port_codes,
                market_data: &state.market_data,
            })
            .await;
        patch.rate_recommendation = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Step 9: determine the next action.
pub(crate) struct NextActionNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for NextActionNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let extracted = state.effective_extraction();
        let (_, missing_fields) =
            crate::validator::validate_for_confirmation(&extracted, state.port_lookup.as_ready());

        let conversation_stage = state
            .conversation
            .as_ready()
            .map(|c| c.conversation_stage.as_str())
            .unwrap_or("unknown");
        let confidence_score = state
            .extraction
            .as_ready()
            .map(|e| e.confidence)
            .unwrap_or(0.0);

        let result = self
            .ctx
            .agents
            .next_action
            .process(NextActionRequest {
                conversation_stage,
                classification: state.classification.as_ready(),
                extracted_data: &extracted,
                confidence_score,
                validation: state.validation.as_ready(),
                enriched: EnrichedData {
                    port_lookup: state.port_lookup.as_ready(),
                    container: state.container.as_ready(),
                    rates: state.rate_recommendation.as_ready(),
                },
                thread_id: &state.thread_id,
                missing_fields: &missing_fields,
            })
            .await;

        if let Ok(next) = &result {
            tracing::info!(action = %next.action, "next action determined");
        }
        patch.next_action = NodeSlot::from_result(result);
        Ok(patch)
    }
}

/// Assign the sales person whose signature the responses carry.
pub(crate) struct AssignSalesPersonNode {
    pub ctx: Arc<NodeContext>,
}

#[async_trait]
impl WorkflowNode for AssignSalesPersonNode {
    async fn run(&self, state: &WorkflowState) -> WorkflowResult<StatePatch> {
        let mut patch = StatePatch::default();
        let person = self.ctx.sales_team.assign_for_thread(&state.thread_id);
        tracing::info!(name = %person.name, "sales person assigned");
        patch.assigned_sales_person = Some(person);
        Ok(patch)
    }
}
