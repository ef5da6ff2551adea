//! Deterministic response generation
//!
//! Renders the four primary outbound emails. Clarifications only phrase
//! the missing-fields list they are handed, in the order they are handed
//! it. Ports display as "name (code)" whenever a code is known.

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AcknowledgmentGenerator, AcknowledgmentRequest, AgentResult, ClarificationGenerator,
    ClarificationRequest, ConfirmationAckGenerator, ConfirmationAckRequest,
    ConfirmationGenerator, ConfirmationRequest, PortLookupOutcome, ResponsePayload,
};
use salesflow_workflow_engine::extraction::Extraction;
use salesflow_workflow_engine::sales_team::SalesPerson;

fn signature(agent_info: Option<&SalesPerson>) -> String {
    agent_info
        .map(|p| p.signature.clone())
        .unwrap_or_else(|| SalesPerson::default_specialist().signature)
}

fn route_display(
    extraction: &Extraction,
    port_lookup: Option<&PortLookupOutcome>,
) -> (String, String) {
    let origin_raw = extraction
        .shipment_details
        .origin
        .as_deref()
        .or(extraction.shipment_details.origin_country.as_deref())
        .unwrap_or("origin");
    let destination_raw = extraction
        .shipment_details
        .destination
        .as_deref()
        .or(extraction.shipment_details.destination_country.as_deref())
        .unwrap_or("destination");
    match port_lookup {
        Some(lookup) => (
            lookup.display_origin(origin_raw),
            lookup.display_destination(destination_raw),
        ),
        None => (origin_raw.to_string(), destination_raw.to_string()),
    }
}

/// Bullet list of everything the customer already told us.
fn format_extracted_info(
    extraction: &Extraction,
    port_lookup: Option<&PortLookupOutcome>,
) -> String {
    let mut sections: Vec<String> = Vec::new();
    let shipment = &extraction.shipment_details;

    let mut lines: Vec<String> = Vec::new();
    if let Some(origin) = &shipment.origin {
        let display = port_lookup
            .map(|l| l.display_origin(origin))
            .unwrap_or_else(|| origin.clone());
        lines.push(format!("- Origin: {}", display));
    }
    if let Some(destination) = &shipment.destination {
        let display = port_lookup
            .map(|l| l.display_destination(destination))
            .unwrap_or_else(|| destination.clone());
        lines.push(format!("- Destination: {}", display));
    }
    if let Some(shipment_type) = shipment.shipment_type {
        lines.push(format!("- Shipment Type: {}", shipment_type));
    }
    if let Some(container_type) = &shipment.container_type {
        lines.push(format!("- Container Type: {}", container_type));
    }
    if let Some(count) = &shipment.container_count {
        lines.push(format!("- Quantity: {}", count));
    }
    if let Some(commodity) = &shipment.commodity {
        lines.push(format!("- Commodity: {}", commodity));
    }
    if let Some(weight) = &shipment.weight {
        lines.push(format!("- Weight: {}", weight));
    }
    if let Some(volume) = &shipment.volume {
        lines.push(format!("- Volume: {}", volume));
    }
    if let Some(date) = extraction.effective_shipment_date() {
        lines.push(format!("- Shipment Date: {}", date));
    }
    if let Some(incoterm) = &shipment.incoterm {
        lines.push(format!("- Incoterm: {}", incoterm));
    }
    if !lines.is_empty() {
        sections.push(format!("Shipment Details:\n{}", lines.join("\n")));
    }

    let contact = &extraction.contact_information;
    let mut lines: Vec<String> = Vec::new();
    if let Some(name) = &contact.name {
        lines.push(format!("- Name: {}", name));
    }
    if let Some(email) = &contact.email {
        lines.push(format!("- Email: {}", email));
    }
    if let Some(phone) = &contact.phone {
        lines.push(format!("- Phone: {}", phone));
    }
    if let Some(company) = &contact.company {
        lines.push(format!("- Company: {}", company));
    }
    if !lines.is_empty() {
        sections.push(format!("Contact Information:\n{}", lines.join("\n")));
    }

    if !extraction.special_requirements.is_empty() {
        let lines: Vec<String> = extraction
            .special_requirements
            .iter()
            .map(|r| format!("- {}", r))
            .collect();
        sections.push(format!("Special Requirements:\n{}", lines.join("\n")));
    }

    if sections.is_empty() {
        "No specific details provided yet.".to_string()
    } else {
        sections.join("\n\n")
    }
}

/// Clarification request for missing information.
pub struct ClarificationResponseAgent;

#[async_trait]
impl ClarificationGenerator for ClarificationResponseAgent {
    async fn process(&self, request: ClarificationRequest<'_>) -> AgentResult<ResponsePayload> {
        let (origin, destination) = route_display(request.extracted_data, request.port_lookup);
        let subject = format!(
            "Additional Information Needed - Shipping from {} to {}",
            origin, destination
        );

        let extracted_info = format_extracted_info(request.extracted_data, request.port_lookup);
        let missing_info = if request.missing_fields.is_empty() {
            "All required information has been provided.".to_string()
        } else {
            request
                .missing_fields
                .iter()
                .map(|f| format!("- {}", f))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let body = format!(
            "Dear {},\n\nThank you for your inquiry. I've reviewed the information you provided and need some additional details to prepare your quote.\n\n{}\n\nMissing Required Information:\n{}\n\nPlease provide these details, and I'll be happy to assist you further.\n\n{}",
            request.customer_name,
            extracted_info,
            missing_info,
            signature(request.agent_info)
        );

        Ok(ResponsePayload {
            response_type: "clarification".to_string(),
            subject,
            body,
            missing_fields: request.missing_fields.to_vec(),
        })
    }
}

/// Confirmation request once every mandatory field is present.
pub struct ConfirmationResponseAgent;

#[async_trait]
impl ConfirmationGenerator for ConfirmationResponseAgent {
    async fn process(&self, request: ConfirmationRequest<'_>) -> AgentResult<ResponsePayload> {
        let (origin, destination) = route_display(request.extracted_data, request.port_lookup);
        let subject = format!(
            "Please Confirm Your Shipment Details - {} to {}",
            origin, destination
        );

        let extracted_info = format_extracted_info(request.extracted_data, request.port_lookup);
        let mut body = format!(
            "Dear {},\n\nThank you for providing the details of your shipment. Please review the summary below and confirm that everything is correct.\n\n{}\n",
            request.customer_name, extracted_info
        );
        if let Some(rates) = request.rate_info {
            if !rates.rate_ranges.is_empty() {
                let lines: Vec<String> = rates
                    .rate_ranges
                    .iter()
                    .map(|(route, band)| format!("- {}: {}", route, band))
                    .collect();
                body.push_str(&format!("\nIndicative Market Rates:\n{}\n", lines.join("\n")));
            }
        }
        body.push_str(&format!(
            "\nIf all details are correct, please reply confirming them and we will proceed with your quote. If anything needs adjusting, just let me know.\n\n{}",
            signature(request.agent_info)
        ));

        Ok(ResponsePayload {
            response_type: "confirmation".to_string(),
            subject,
            body,
            missing_fields: Vec::new(),
        })
    }
}

/// Acknowledgment for sales-person and forwarder senders.
pub struct AcknowledgmentResponseAgent;

#[async_trait]
impl AcknowledgmentGenerator for AcknowledgmentResponseAgent {
    async fn process(&self, request: AcknowledgmentRequest<'_>) -> AgentResult<ResponsePayload> {
        let subject = if request.subject.trim().is_empty() {
            "Thank you for your email".to_string()
        } else {
            format!("Re: {}", request.subject.trim())
        };

        let body = match request.sender_type {
            "forwarder" => format!(
                "Dear partner,\n\nThank you for your rates. We have received your information and are reviewing it against the customer's requirements. We will revert shortly with the next steps.\n\n{}",
                signature(Some(request.sales_person))
            ),
            "sales_person" => format!(
                "Hi,\n\nNoted with thanks. The thread has been updated and the details are captured in the system.\n\n{}",
                signature(Some(request.sales_person))
            ),
            _ => format!(
                "Dear customer,\n\nThank you for your email. We have received your message and will get back to you shortly.\n\n{}",
                signature(Some(request.sales_person))
            ),
        };

        Ok(ResponsePayload {
            response_type: "acknowledgment".to_string(),
            subject,
            body,
            missing_fields: Vec::new(),
        })
    }
}

/// Acknowledgment of a customer's confirmation; promises the quote.
pub struct ConfirmationAcknowledgmentAgent;

#[async_trait]
impl ConfirmationAckGenerator for ConfirmationAcknowledgmentAgent {
    async fn process(&self, request: ConfirmationAckRequest<'_>) -> AgentResult<ResponsePayload> {
        let (origin, destination) = route_display(request.extracted_data, request.port_lookup);
        let subject = format!(
            "Shipment Details Confirmed - {} to {}",
            origin, destination
        );

        let extracted_info = format_extracted_info(request.extracted_data, request.port_lookup);
        let body = format!(
            "Dear {},\n\nThank you for confirming your shipment details. We are now requesting rates from our partner network for the shipment below.\n\n{}\n\nYou can expect your quote within {}. We will be in touch as soon as the rates are in.\n\n{}",
            request.customer_name,
            extracted_info,
            request.quote_timeline,
            signature(request.agent_info)
        );

        Ok(ResponsePayload {
            response_type: "confirmation_acknowledgment".to_string(),
            subject,
            body,
            missing_fields: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesflow_workflow_engine::adapters::{PortCodes, PortInfo};
    use salesflow_workflow_engine::extraction::ShipmentType;

    fn lookup() -> PortLookupOutcome {
        PortLookupOutcome {
            origin: Some(PortInfo {
                port_name: "Shanghai".to_string(),
                port_code: Some("CNSHA".to_string()),
                country: Some("China".to_string()),
                is_country: false,
            }),
            destination: Some(PortInfo {
                port_name: "Los Angeles".to_string(),
                port_code: Some("USLAX".to_string()),
                country: Some("USA".to_string()),
                is_country: false,
            }),
            port_codes: PortCodes {
                origin: Some("CNSHA".to_string()),
                destination: Some("USLAX".to_string()),
            },
        }
    }

    fn extraction() -> Extraction {
        let mut extraction = Extraction::default();
        let s = &mut extraction.shipment_details;
        s.origin = Some("Shanghai".to_string());
        s.destination = Some("Los Angeles".to_string());
        s.container_type = Some("40HC".to_string());
        s.container_count = Some("2".to_string());
        s.commodity = Some("Electronics".to_string());
        s.shipment_type = Some(ShipmentType::Fcl);
        s.shipment_date = Some("2024-03-15".to_string());
        extraction
    }

    #[tokio::test]
    async fn clarification_lists_exactly_the_given_missing_fields() {
        let extraction = Extraction::default();
        let missing = vec![
            "Destination (specific port required)".to_string(),
            "Origin (specific port required)".to_string(),
            "Weight".to_string(),
        ];
        let payload = ClarificationResponseAgent
            .process(ClarificationRequest {
                extracted_data: &extraction,
                missing_fields: &missing,
                customer_name: "John",
                agent_info: None,
                port_lookup: None,
                container: None,
            })
            .await
            .unwrap();

        assert_eq!(payload.response_type, "clarification");
        let destination_pos = payload
            .body
            .find("- Destination (specific port required)")
            .unwrap();
        let origin_pos = payload.body.find("- Origin (specific port required)").unwrap();
        let weight_pos = payload.body.find("- Weight").unwrap();
        assert!(destination_pos < origin_pos && origin_pos < weight_pos);
        assert!(payload.body.starts_with("Dear John,"));
    }

    #[tokio::test]
    async fn confirmation_subject_carries_both_port_codes() {
        let extraction = extraction();
        let lookup = lookup();
        let payload = ConfirmationResponseAgent
            .process(ConfirmationRequest {
                extracted_data: &extraction,
                customer_name: "John",
                agent_info: None,
                rate_info: None,
                container: None,
                port_lookup: Some(&lookup),
            })
            .await
            .unwrap();
        assert!(payload.subject.contains("CNSHA"));
        assert!(payload.subject.contains("USLAX"));
        assert_eq!(payload.response_type, "confirmation");
    }

    #[tokio::test]
    async fn acknowledgment_is_sender_type_specific() {
        let details = serde_json::Value::Null;
        let person = SalesPerson::default_specialist();
        let payload = AcknowledgmentResponseAgent
            .process(AcknowledgmentRequest {
                sender_type: "forwarder",
                sender_email: "rates@pacificbridge.example",
                sender_details: &details,
                email_content: "rates attached",
                subject: "Rates for CNSHA-USLAX",
                thread_id: "thread_1",
                sales_person: &person,
            })
            .await
            .unwrap();
        assert!(payload.body.contains("Thank you for your rates"));
        assert_eq!(payload.subject, "Re: Rates for CNSHA-USLAX");
    }

    #[tokio::test]
    async fn confirmation_ack_promises_the_quote_timeline() {
        let extraction = extraction();
        let payload = ConfirmationAcknowledgmentAgent
            .process(ConfirmationAckRequest {
                extracted_data: &extraction,
                customer_name: "John",
                agent_info: None,
                quote_timeline: "24 hours",
                port_lookup: None,
                container: None,
            })
            .await
            .unwrap();
        assert!(payload.body.contains("within 24 hours"));
        assert_eq!(payload.response_type, "confirmation_acknowledgment");
    }
}
