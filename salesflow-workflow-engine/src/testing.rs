//! Scripted collaborators for exercising the engine in tests
//!
//! These stubs answer with fixed payloads so engine behavior can be
//! tested without the reference collaborator crate. Not intended for
//! production wiring.

use crate::adapters::{
    AcknowledgmentGenerator, AcknowledgmentRequest, AgentError, AgentResult, AgentSet,
    Classification, ClarificationGenerator, ClarificationRequest, ClassifyRequest,
    ConfirmationAckGenerator, ConfirmationAckRequest, ConfirmationGenerator, ConfirmationRequest,
    ContainerRequest, ContainerStandardization, ContainerStandardizer, ConversationAssessment,
    ConversationRequest, ConversationStateAgent, DataValidator, EmailClassifier, ExtractRequest,
    ExtractionOutcome, ForwarderDetectRequest, ForwarderDetection, ForwarderDetector,
    ForwarderDraftComposer, ForwarderDraftRequest, ForwarderReply, ForwarderReplyProcessor,
    ForwarderReplyRequest, InformationExtractor, NextAction, NextActionAgent, NextActionRequest,
    PortInfo, PortLookup, RateInfo, RateRecommendation, RateRecommender, RateRequest,
    RateRequestDraft, ResponsePayload, SalesNotification, SalesNotifier, SalesNotifyRequest,
    SenderClassification, ThreadAnalysisRequest, ThreadAnalyzer, ValidateRequest,
    ValidationReport,
};
use crate::extraction::Extraction;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A classification with the given sender kind and email type.
pub fn classification(kind: &str, email_type: &str) -> Classification {
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

struct ScriptedClassifier(Classification);

#[async_trait]
impl EmailClassifier for ScriptedClassifier {
    async fn process(&self, _request: ClassifyRequest<'_>) -> AgentResult<Classification> {
        Ok(self.0.clone())
    }
}

/// A classifier that always fails, for degradation tests.
pub struct FailingClassifier;

#[async_trait]
impl EmailClassifier for FailingClassifier {
    async fn process(&self, _request: ClassifyRequest<'_>) -> AgentResult<Classification> {
        Err(AgentError::new("classifier unavailable"))
    }
}

struct ScriptedConversation(String);

#[async_trait]
impl ConversationStateAgent for ScriptedConversation {
    async fn process(
        &self,
        _request: ConversationRequest<'_>,
    ) -> AgentResult<ConversationAssessment> {
        Ok(ConversationAssessment {
            conversation_stage: self.0.clone(),
            latest_sender: "customer".to_string(),
            next_action: None,
            should_escalate: false,
            thread_context: Value::Null,
        })
    }
}

struct ScriptedAnalyzer;

#[async_trait]
impl ThreadAnalyzer for ScriptedAnalyzer {
    async fn process(&self, request: ThreadAnalysisRequest<'_>) -> AgentResult<Value> {
        Ok(serde_json::json!({ "email_count": request.thread_history.len() }))
    }
}

struct ScriptedExtractor(Extraction);

#[async_trait]
impl InformationExtractor for ScriptedExtractor {
    async fn process(&self, _request: ExtractRequest<'_>) -> AgentResult<ExtractionOutcome> {
        Ok(ExtractionOutcome {
            extracted_data: self.0.clone(),
            quality_score: 0.8,
            confidence: 0.8,
        })
    }
}

struct ScriptedValidator;

#[async_trait]
impl DataValidator for ScriptedValidator {
    async fn process(&self, _request: ValidateRequest<'_>) -> AgentResult<ValidationReport> {
        Ok(ValidationReport {
            validation_status: "checked".to_string(),
            confidence: 0.8,
        })
    }
}

struct TablePortLookup;

#[async_trait]
impl PortLookup for TablePortLookup {
    async fn lookup(&self, port_name: &str) -> AgentResult<PortInfo> {
        let info = match port_name.to_lowercase().as_str() {
            "shanghai" => PortInfo {
                port_name: "Shanghai".to_string(),
                port_code: Some("CNSHA".to_string()),
                country: Some("China".to_string()),
                is_country: false,
            },
            "los angeles" => PortInfo {
                port_name: "Los Angeles".to_string(),
                port_code: Some("USLAX".to_string()),
                country: Some("USA".to_string()),
                is_country: false,
            },
            "usa" | "china" => PortInfo {
                port_name: port_name.to_string(),
                port_code: None,
                country: Some(port_name.to_string()),
                is_country: true,
            },
            other => PortInfo {
                port_name: other.to_string(),
                port_code: None,
                country: None,
                is_country: false,
            },
        };
        Ok(info)
    }
}

struct ScriptedContainer;

#[async_trait]
impl ContainerStandardizer for ScriptedContainer {
    async fn process(
        &self,
        request: ContainerRequest<'_>,
    ) -> AgentResult<ContainerStandardization> {
        Ok(ContainerStandardization {
            standardized_type: Some(request.container_type.to_uppercase()),
            rate_fallback_type: Some("40GP".to_string()),
            reason: None,
        })
    }
}

struct ScriptedRates;

#[async_trait]
impl RateRecommender for ScriptedRates {
    async fn process(&self, _request: RateRequest<'_>) -> AgentResult<RateRecommendation> {
        Ok(RateRecommendation {
            status: "ok".to_string(),
            ..Default::default()
        })
    }
}

struct ScriptedNextAction;

#[async_trait]
impl NextActionAgent for ScriptedNextAction {
    async fn process(&self, request: NextActionRequest<'_>) -> AgentResult<NextAction> {
        let action = if request.missing_fields.is_empty() {
            "send_confirmation_request"
        } else {
            "send_clarification_request"
        };
        Ok(NextAction {
            action: action.to_string(),
            missing_fields: request.missing_fields.to_vec(),
            confidence: 0.8,
            reasoning: None,
        })
    }
}

fn payload(response_type: &str, subject: String) -> ResponsePayload {
    ResponsePayload {
        response_type: response_type.to_string(),
        subject,
        body: format!("scripted {} body", response_type),
        missing_fields: Vec::new(),
    }
}

struct ScriptedClarification;

#[async_trait]
impl ClarificationGenerator for ScriptedClarification {
    async fn process(&self, request: ClarificationRequest<'_>) -> AgentResult<ResponsePayload> {
        let mut response = payload("clarification", "Additional Information Needed".to_string());
        response.missing_fields = request.missing_fields.to_vec();
        Ok(response)
    }
}

struct ScriptedConfirmation;

#[async_trait]
impl ConfirmationGenerator for ScriptedConfirmation {
    async fn process(&self, request: ConfirmationRequest<'_>) -> AgentResult<ResponsePayload> {
        let origin = request
            .extracted_data
            .shipment_details
            .origin
            .as_deref()
            .unwrap_or("origin");
        let destination = request
            .extracted_data
            .shipment_details
            .destination
            .as_deref()
            .unwrap_or("destination");
        let (origin, destination) = match request.port_lookup {
            Some(lookup) => (
                lookup.display_origin(origin),
                lookup.display_destination(destination),
            ),
            None => (origin.to_string(), destination.to_string()),
        };
        Ok(payload(
            "confirmation",
            format!("Please Confirm Your Shipment Details - {} to {}", origin, destination),
        ))
    }
}

struct ScriptedAcknowledgment;

#[async_trait]
impl AcknowledgmentGenerator for ScriptedAcknowledgment {
    async fn process(&self, request: AcknowledgmentRequest<'_>) -> AgentResult<ResponsePayload> {
        Ok(payload(
            "acknowledgment",
            format!("Re: {}", request.subject),
        ))
    }
}

struct ScriptedConfirmationAck;

#[async_trait]
impl ConfirmationAckGenerator for ScriptedConfirmationAck {
    async fn process(&self, _request: ConfirmationAckRequest<'_>) -> AgentResult<ResponsePayload> {
        Ok(payload(
            "confirmation_acknowledgment",
            "Shipment Details Confirmed".to_string(),
        ))
    }
}

struct RegistryDetector;

#[async_trait]
impl ForwarderDetector for RegistryDetector {
    async fn process(
        &self,
        request: ForwarderDetectRequest<'_>,
    ) -> AgentResult<ForwarderDetection> {
        Ok(ForwarderDetection {
            is_forwarder: request.registry.is_forwarder_email(request.sender),
            forwarder: request.registry.by_email(request.sender).cloned(),
        })
    }
}

struct ScriptedReply(RateInfo);

#[async_trait]
impl ForwarderReplyProcessor for ScriptedReply {
    async fn process(&self, request: ForwarderReplyRequest<'_>) -> AgentResult<ForwarderReply> {
        Ok(ForwarderReply {
            forwarder_name: "Scripted Forwarder".to_string(),
            forwarder_email: request.sender.to_string(),
            rate_info: self.0.clone(),
        })
    }
}

struct ScriptedDraft;

#[async_trait]
impl ForwarderDraftComposer for ScriptedDraft {
    async fn process(&self, request: ForwarderDraftRequest<'_>) -> AgentResult<RateRequestDraft> {
        Ok(RateRequestDraft {
            to: request.forwarder.email.clone(),
            from: "sales@scripted.example".to_string(),
            subject: "Rate Request".to_string(),
            body: "scripted rate request".to_string(),
        })
    }
}

struct ScriptedNotifier;

#[async_trait]
impl SalesNotifier for ScriptedNotifier {
    async fn process(&self, request: SalesNotifyRequest<'_>) -> AgentResult<SalesNotification> {
        Ok(SalesNotification {
            notification_type: request.notification_type.to_string(),
            to: "Sales Team".to_string(),
            subject: "scripted notification".to_string(),
            body: String::new(),
            urgency: Some(request.urgency.to_string()),
        })
    }
}

/// Builder for a scripted collaborator set.
pub struct ScriptedAgents {
    pub classification: Classification,
    pub conversation_stage: String,
    pub extraction: Extraction,
    pub forwarder_rates: RateInfo,
}

impl ScriptedAgents {
    /// A plain customer inquiry extracting the given data.
    pub fn customer_inquiry(extraction: Extraction) -> Self {
        ScriptedAgents {
            classification: classification("customer", "customer_inquiry"),
            conversation_stage: "customer_initial_request".to_string(),
            extraction,
            forwarder_rates: RateInfo::default(),
        }
    }

    /// A customer confirmation turn extracting the given data.
    pub fn customer_confirmation(extraction: Extraction) -> Self {
        ScriptedAgents {
            classification: classification("customer", "customer_confirmation"),
            conversation_stage: "customer_confirmation".to_string(),
            extraction,
            forwarder_rates: RateInfo::default(),
        }
    }

    /// A forwarder rate reply carrying the given rates.
    pub fn forwarder_reply(rates: RateInfo) -> Self {
        ScriptedAgents {
            classification: classification("forwarder", "forwarder_response"),
            conversation_stage: "forwarder_reply".to_string(),
            extraction: Extraction::default(),
            forwarder_rates: rates,
        }
    }

    /// Materialize the collaborator set.
    pub fn build(self) -> AgentSet {
        AgentSet {
            classifier: Arc::new(ScriptedClassifier(self.classification)),
            conversation: Arc::new(ScriptedConversation(self.conversation_stage)),
            thread_analyzer: Arc::new(ScriptedAnalyzer),
            extractor: Arc::new(ScriptedExtractor(self.extraction)),
            validator: Arc::new(ScriptedValidator),
            port_lookup: Arc::new(TablePortLookup),
            container: Arc::new(ScriptedContainer),
            rates: Arc::new(ScriptedRates),
            next_action: Arc::new(ScriptedNextAction),
            clarification: Arc::new(ScriptedClarification),
            confirmation: Arc::new(ScriptedConfirmation),
            acknowledgment: Arc::new(ScriptedAcknowledgment),
            confirmation_ack: Arc::new(ScriptedConfirmationAck),
            forwarder_detector: Arc::new(RegistryDetector),
            forwarder_reply: Arc::new(ScriptedReply(self.forwarder_rates)),
            forwarder_draft: Arc::new(ScriptedDraft),
            sales_notifier: Arc::new(ScriptedNotifier),
        }
    }

    /// Materialize the set with a failing classifier.
    pub fn build_with_failing_classifier(self) -> AgentSet {
        let mut set = self.build();
        set.classifier = Arc::new(FailingClassifier);
        set
    }
}
