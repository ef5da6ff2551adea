//! Sales-team notification rendering

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AgentResult, SalesNotification, SalesNotifier, SalesNotifyRequest,
};

/// Collates customer, shipment and forwarder facts into one internal
/// notification.
pub struct SalesNotificationAgent;

#[async_trait]
impl SalesNotifier for SalesNotificationAgent {
    async fn process(&self, request: SalesNotifyRequest<'_>) -> AgentResult<SalesNotification> {
        let origin = request
            .shipment_details
            .origin
            .as_deref()
            .or(request.shipment_details.origin_country.as_deref())
            .unwrap_or("unknown origin");
        let destination = request
            .shipment_details
            .destination
            .as_deref()
            .or(request.shipment_details.destination_country.as_deref())
            .unwrap_or("unknown destination");
        let customer = request
            .customer_details
            .email
            .as_deref()
            .or(request.customer_details.name.as_deref())
            .unwrap_or("unknown customer");

        let tag = match request.notification_type {
            "rates_received" => "RATES RECEIVED",
            _ => "DEAL UPDATE",
        };
        let subject = format!("[{}] {} to {} - {}", tag, origin, destination, customer);

        let mut lines = vec![
            format!("Notification: {}", request.notification_type),
            format!("Thread: {}", request.thread_id),
            format!("Conversation state: {}", request.conversation_state),
            format!("Urgency: {}", request.urgency),
            String::new(),
            format!("Route: {} -> {}", origin, destination),
        ];
        if let Some(container_type) = &request.shipment_details.container_type {
            lines.push(format!("Container: {}", container_type));
        }
        if let Some(commodity) = &request.shipment_details.commodity {
            lines.push(format!("Commodity: {}", commodity));
        }
        if let Some(dates) = &request.timeline_information.requested_dates {
            lines.push(format!("Requested dates: {}", dates));
        }

        if !request.forwarder_rates.is_empty() {
            lines.push(String::new());
            lines.push("Forwarder rates:".to_string());
            for rate in request.forwarder_rates {
                let currency = rate.currency.as_deref().unwrap_or("USD");
                if let Some(value) = &rate.rate {
                    lines.push(format!("- Rate: {} {}", value, currency));
                }
                if let Some(value) = &rate.rate_with_othc {
                    lines.push(format!("- With OTHC: {} {}", value, currency));
                }
                if let Some(transit) = &rate.transit_time {
                    lines.push(format!("- Transit: {} days", transit));
                }
                if let Some(valid) = &rate.valid_until {
                    lines.push(format!("- Valid until: {}", valid));
                }
            }
        }
        if let Some(name) = request.forwarder_details.get("name").and_then(|v| v.as_str()) {
            lines.push(format!("Forwarder: {}", name));
        }

        Ok(SalesNotification {
            notification_type: request.notification_type.to_string(),
            to: "Sales Team".to_string(),
            subject,
            body: lines.join("\n"),
            urgency: Some(request.urgency.to_string()),
        })
    }
}
