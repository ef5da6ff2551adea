//! Data validation collaborator

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AgentResult, DataValidator, ValidateRequest, ValidationReport,
};
use salesflow_workflow_engine::validator::validate_for_confirmation;

/// Completeness and consistency check over the extracted data.
pub struct DataValidationAgent;

#[async_trait]
impl DataValidator for DataValidationAgent {
    async fn process(&self, request: ValidateRequest<'_>) -> AgentResult<ValidationReport> {
        let (complete, missing) = validate_for_confirmation(request.extracted_data, None);

        let shipment = &request.extracted_data.shipment_details;
        let mut consistent = true;
        if let (Some(origin), Some(destination)) = (&shipment.origin, &shipment.destination) {
            if origin.eq_ignore_ascii_case(destination) {
                consistent = false;
            }
        }

        let validation_status = if !consistent {
            "inconsistent"
        } else if complete {
            "complete"
        } else {
            "incomplete"
        };
        let confidence = if !consistent {
            0.4
        } else if complete {
            0.9
        } else {
            // Confidence in the verdict stays decent; the data is simply
            // incomplete.
            0.75 - 0.05 * (missing.len().min(5) as f64)
        };

        Ok(ValidationReport {
            validation_status: validation_status.to_string(),
            confidence,
        })
    }
}
