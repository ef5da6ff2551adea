//! Sender-registry email classification

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AgentResult, Classification, ClassifyRequest, EmailClassifier, SenderClassification,
};
use salesflow_workflow_engine::forwarder::ForwarderRegistry;
use salesflow_workflow_engine::sales_team::SalesTeam;
use std::sync::Arc;

/// Classifies emails by sender registry membership and a confirmation
/// keyword check. Forwarder and sales-person addresses come from the
/// same registries the engine routes with.
pub struct EmailClassifierAgent {
    forwarders: Arc<ForwarderRegistry>,
    sales_team: Arc<SalesTeam>,
}

impl EmailClassifierAgent {
    pub fn new(forwarders: Arc<ForwarderRegistry>, sales_team: Arc<SalesTeam>) -> Self {
        Self {
            forwarders,
            sales_team,
        }
    }
}

#[async_trait]
impl EmailClassifier for EmailClassifierAgent {
    async fn process(&self, request: ClassifyRequest<'_>) -> AgentResult<Classification> {
        let sender = request.sender.trim();

        if let Some(forwarder) = self.forwarders.by_email(sender) {
            return Ok(Classification {
                email_type: "forwarder_response".to_string(),
                sender_type: "forwarder".to_string(),
                sender_classification: SenderClassification {
                    kind: "forwarder".to_string(),
                    details: serde_json::json!({
                        "name": forwarder.name,
                        "company": forwarder.company_name(),
                        "country": forwarder.country,
                    }),
                    confidence: 0.95,
                },
                confidence: 0.95,
                escalation_needed: false,
                intent: Some("rate_reply".to_string()),
                reasoning: Some("sender is a registered forwarder".to_string()),
            });
        }

        if self.sales_team.is_sales_email(sender) {
            return Ok(Classification {
                email_type: "sales_update".to_string(),
                sender_type: "sales_person".to_string(),
                sender_classification: SenderClassification {
                    kind: "sales_person".to_string(),
                    details: serde_json::json!({ "email": sender }),
                    confidence: 0.95,
                },
                confidence: 0.95,
                escalation_needed: false,
                intent: Some("internal_update".to_string()),
                reasoning: Some("sender is on the sales roster".to_string()),
            });
        }

        let text = format!("{} {}", request.subject, request.email_text).to_lowercase();
        let confirmed = text.contains("confirm");
        let email_type = if confirmed {
            "customer_confirmation"
        } else {
            "customer_inquiry"
        };
        Ok(Classification {
            email_type: email_type.to_string(),
            sender_type: "customer".to_string(),
            sender_classification: SenderClassification {
                kind: "customer".to_string(),
                details: serde_json::json!({ "email": sender }),
                confidence: 0.9,
            },
            confidence: 0.9,
            escalation_needed: false,
            intent: Some(if confirmed {
                "confirmation".to_string()
            } else {
                "quote_request".to_string()
            }),
            reasoning: Some("sender is not in any internal registry".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> EmailClassifierAgent {
        EmailClassifierAgent::new(
            Arc::new(ForwarderRegistry::default_registry()),
            Arc::new(SalesTeam::default_roster()),
        )
    }

    fn request<'a>(sender: &'a str, body: &'a str) -> ClassifyRequest<'a> {
        ClassifyRequest {
            email_text: body,
            subject: "",
            sender,
            thread_id: "thread_1",
            thread_history: &[],
        }
    }

    #[tokio::test]
    async fn forwarder_sender_is_classified_as_forwarder() {
        let result = agent()
            .process(request("rates@pacificbridge.example", "rates attached"))
            .await
            .unwrap();
        assert_eq!(result.sender_classification.kind, "forwarder");
        assert_eq!(result.email_type, "forwarder_response");
    }

    #[tokio::test]
    async fn confirmation_keyword_drives_email_type() {
        let result = agent()
            .process(request(
                "customer@example.com",
                "I confirm the details. Please proceed.",
            ))
            .await
            .unwrap();
        assert_eq!(result.email_type, "customer_confirmation");

        let result = agent()
            .process(request("customer@example.com", "Please send me a quote."))
            .await
            .unwrap();
        assert_eq!(result.email_type, "customer_inquiry");
    }
}
