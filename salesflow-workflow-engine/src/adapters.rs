//! Collaborator contracts for the agent adapters
//!
//! Every external collaborator exposes a single typed operation. The
//! orchestrator promises the request shapes defined here; collaborators
//! answer with the typed payloads the node slots consume. Collaborator
//! internals (prompting, heuristics, lookup tables) live outside this
//! crate.

use crate::extraction::{ContactInformation, Extraction, ShipmentDetails, TimelineInformation};
use crate::forwarder::{Forwarder, ForwarderRegistry};
use crate::sales_team::SalesPerson;
use crate::thread_store::EmailEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Error a collaborator converts its internal failures into.
///
/// Adapters never panic through the engine: a failed call is recorded in
/// the calling node's slot and the turn continues degraded.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct AgentError(pub String);

impl AgentError {
    pub fn new(message: impl Into<String>) -> Self {
        AgentError(message.into())
    }
}

/// Result of one collaborator call.
pub type AgentResult<T> = Result<T, AgentError>;

/// Sender classification attached by the email classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderClassification {
    /// `customer`, `forwarder` or `sales_person`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: Value,
    pub confidence: f64,
}

/// Result of the email classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub email_type: String,
    pub sender_type: String,
    pub sender_classification: SenderClassification,
    pub confidence: f64,
    #[serde(default)]
    pub escalation_needed: bool,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Request shape for the email classifier.
pub struct ClassifyRequest<'a> {
    pub email_text: &'a str,
    pub subject: &'a str,
    pub sender: &'a str,
    pub thread_id: &'a str,
    pub thread_history: &'a [EmailEntry],
}

#[async_trait]
pub trait EmailClassifier: Send + Sync {
    async fn process(&self, request: ClassifyRequest<'_>) -> AgentResult<Classification>;
}

/// Result of the conversation-state collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationAssessment {
    pub conversation_stage: String,
    pub latest_sender: String,
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default)]
    pub should_escalate: bool,
    #[serde(default)]
    pub thread_context: Value,
}

/// Request shape for the conversation-state collaborator.
pub struct ConversationRequest<'a> {
    pub email_text: &'a str,
    pub subject: &'a str,
    pub thread_id: &'a str,
    pub thread_history: &'a [EmailEntry],
    pub cumulative_extraction: &'a Extraction,
    pub customer_context: &'a Value,
    pub forwarder_context: &'a Value,
}

#[async_trait]
pub trait ConversationStateAgent: Send + Sync {
    async fn process(&self, request: ConversationRequest<'_>) -> AgentResult<ConversationAssessment>;
}

/// Request shape for the thread analyzer; the response is free-form.
pub struct ThreadAnalysisRequest<'a> {
    pub email_text: &'a str,
    pub subject: &'a str,
    pub sender: &'a str,
    pub thread_id: &'a str,
    pub thread_history: &'a [EmailEntry],
    pub previous_classifications: &'a [Value],
    pub customer_context: &'a Value,
    pub forwarder_context: &'a Value,
}

#[async_trait]
pub trait ThreadAnalyzer: Send + Sync {
    async fn process(&self, request: ThreadAnalysisRequest<'_>) -> AgentResult<Value>;
}

/// Result of the information extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub extracted_data: Extraction,
    pub quality_score: f64,
    pub confidence: f64,
}

/// Request shape for the information extractor.
pub struct ExtractRequest<'a> {
    pub email_text: &'a str,
    pub sender: &'a str,
    pub subject: &'a str,
    pub thread_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub customer_context: &'a Value,
    pub forwarder_context: &'a Value,
    /// Always true: the most recent mention of a fact is authoritative.
    pub prioritize_recent: bool,
    pub cumulative_extraction: &'a Extraction,
}

#[async_trait]
pub trait InformationExtractor: Send + Sync {
    async fn process(&self, request: ExtractRequest<'_>) -> AgentResult<ExtractionOutcome>;
}

/// Result of the data-validation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: String,
    pub confidence: f64,
}

/// Request shape for the data-validation collaborator.
pub struct ValidateRequest<'a> {
    pub extracted_data: &'a Extraction,
    pub validation_rules: &'a Value,
}

#[async_trait]
pub trait DataValidator: Send + Sync {
    async fn process(&self, request: ValidateRequest<'_>) -> AgentResult<ValidationReport>;
}

/// Per-port answer of the port lookup collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortInfo {
    pub port_name: String,
    #[serde(default)]
    pub port_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// True when the queried name is a country rather than a port
    #[serde(default)]
    pub is_country: bool,
}

impl PortInfo {
    /// Display form `"<port name> (<port code>)"` when a code is known.
    pub fn display(&self) -> String {
        match &self.port_code {
            Some(code) => format!("{} ({})", self.port_name, code),
            None => self.port_name.clone(),
        }
    }
}

/// Port codes extracted for the rate collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortCodes {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

/// Combined origin/destination lookup stored in the port-lookup slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortLookupOutcome {
    #[serde(default)]
    pub origin: Option<PortInfo>,
    #[serde(default)]
    pub destination: Option<PortInfo>,
    #[serde(default)]
    pub port_codes: PortCodes,
}

impl PortLookupOutcome {
    /// Display form for a leg, falling back to the raw extraction value.
    pub fn display_origin(&self, fallback: &str) -> String {
        self.origin
            .as_ref()
            .map(PortInfo::display)
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn display_destination(&self, fallback: &str) -> String {
        self.destination
            .as_ref()
            .map(PortInfo::display)
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[async_trait]
pub trait PortLookup: Send + Sync {
    /// Invoked once per port name.
    async fn lookup(&self, port_name: &str) -> AgentResult<PortInfo>;
}

/// Result of the container standardization collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerStandardization {
    /// Standardized type used for display and drafts
    #[serde(default)]
    pub standardized_type: Option<String>,
    /// Pricing fallback type; never used for display
    #[serde(default)]
    pub rate_fallback_type: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request shape for container standardization. FCL only; the
/// orchestrator skips the call for LCL shipments.
pub struct ContainerRequest<'a> {
    pub container_type: &'a str,
    pub container_count: Option<&'a str>,
}

#[async_trait]
pub trait ContainerStandardizer: Send + Sync {
    async fn process(&self, request: ContainerRequest<'_>) -> AgentResult<ContainerStandardization>;
}

/// Result of the rate recommendation collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateRecommendation {
    pub status: String,
    #[serde(default)]
    pub rate_ranges: BTreeMap<String, String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Request shape for rate recommendation.
pub struct RateRequest<'a> {
    /// Shipment details with the standardized container type substituted
    pub shipment_details: &'a ShipmentDetails,
    pub port_codes: &'a PortCodes,
    pub market_data: &'a Value,
}

#[async_trait]
pub trait RateRecommender: Send + Sync {
    async fn process(&self, request: RateRequest<'_>) -> AgentResult<RateRecommendation>;
}

/// Result of the next-action collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextAction {
    pub action: String,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Enriched per-turn data handed to the next-action collaborator.
#[derive(Default)]
pub struct EnrichedData<'a> {
    pub port_lookup: Option<&'a PortLookupOutcome>,
    pub container: Option<&'a ContainerStandardization>,
    pub rates: Option<&'a RateRecommendation>,
}

/// Request shape for the next-action collaborator.
pub struct NextActionRequest<'a> {
    pub conversation_stage: &'a str,
    pub classification: Option<&'a Classification>,
    pub extracted_data: &'a Extraction,
    pub confidence_score: f64,
    pub validation: Option<&'a ValidationReport>,
    pub enriched: EnrichedData<'a>,
    pub thread_id: &'a str,
    pub missing_fields: &'a [String],
}

#[async_trait]
pub trait NextActionAgent: Send + Sync {
    async fn process(&self, request: NextActionRequest<'_>) -> AgentResult<NextAction>;
}

/// Outbound email produced by a response generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub response_type: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub missing_fields: Vec<String>,
}

/// Request shape for the clarification generator. The missing-fields list
/// is the validator's, already in priority order; the generator must not
/// invent questions beyond it.
pub struct ClarificationRequest<'a> {
    pub extracted_data: &'a Extraction,
    pub missing_fields: &'a [String],
    pub customer_name: &'a str,
    pub agent_info: Option<&'a SalesPerson>,
    pub port_lookup: Option<&'a PortLookupOutcome>,
    pub container: Option<&'a ContainerStandardization>,
}

#[async_trait]
pub trait ClarificationGenerator: Send + Sync {
    async fn process(&self, request: ClarificationRequest<'_>) -> AgentResult<ResponsePayload>;
}

/// Request shape for the confirmation generator. Only invoked after the
/// mandatory-field gate passed.
pub struct ConfirmationRequest<'a> {
    pub extracted_data: &'a Extraction,
    pub customer_name: &'a str,
    pub agent_info: Option<&'a SalesPerson>,
    pub rate_info: Option<&'a RateRecommendation>,
    pub container: Option<&'a ContainerStandardization>,
    pub port_lookup: Option<&'a PortLookupOutcome>,
}

#[async_trait]
pub trait ConfirmationGenerator: Send + Sync {
    async fn process(&self, request: ConfirmationRequest<'_>) -> AgentResult<ResponsePayload>;
}

/// Request shape for the acknowledgment generator (sales-person and
/// forwarder senders; never gated by the validator).
pub struct AcknowledgmentRequest<'a> {
    pub sender_type: &'a str,
    pub sender_email: &'a str,
    pub sender_details: &'a Value,
    pub email_content: &'a str,
    pub subject: &'a str,
    pub thread_id: &'a str,
    pub sales_person: &'a SalesPerson,
}

#[async_trait]
pub trait AcknowledgmentGenerator: Send + Sync {
    async fn process(&self, request: AcknowledgmentRequest<'_>) -> AgentResult<ResponsePayload>;
}

/// Request shape for the confirmation acknowledgment generator. Only
/// invoked when the customer confirmed and the gate passed.
pub struct ConfirmationAckRequest<'a> {
    pub extracted_data: &'a Extraction,
    pub customer_name: &'a str,
    pub agent_info: Option<&'a SalesPerson>,
    pub quote_timeline: &'a str,
    pub port_lookup: Option<&'a PortLookupOutcome>,
    pub container: Option<&'a ContainerStandardization>,
}

#[async_trait]
pub trait ConfirmationAckGenerator: Send + Sync {
    async fn process(&self, request: ConfirmationAckRequest<'_>) -> AgentResult<ResponsePayload>;
}

/// Result of forwarder detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwarderDetection {
    pub is_forwarder: bool,
    #[serde(default)]
    pub forwarder: Option<Forwarder>,
}

/// Request shape for forwarder detection.
pub struct ForwarderDetectRequest<'a> {
    pub sender: &'a str,
    pub email_text: &'a str,
    pub registry: &'a ForwarderRegistry,
}

#[async_trait]
pub trait ForwarderDetector: Send + Sync {
    async fn process(&self, request: ForwarderDetectRequest<'_>) -> AgentResult<ForwarderDetection>;
}

/// Rate facts extracted from a forwarder reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateInfo {
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub rate_with_othc: Option<String>,
    #[serde(default)]
    pub rate_with_dthc: Option<String>,
    #[serde(default)]
    pub transit_time: Option<String>,
    #[serde(default)]
    pub valid_until: Option<String>,
    #[serde(default)]
    pub sailing_date: Option<String>,
}

impl RateInfo {
    /// True when any actual rate value is present.
    pub fn has_rates(&self) -> bool {
        self.rate.is_some() || self.rate_with_othc.is_some() || self.rate_with_dthc.is_some()
    }
}

/// Result of forwarder-reply processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwarderReply {
    pub forwarder_name: String,
    pub forwarder_email: String,
    pub rate_info: RateInfo,
}

/// Request shape for forwarder-reply processing.
pub struct ForwarderReplyRequest<'a> {
    pub sender: &'a str,
    pub email_text: &'a str,
    pub forwarder_info: Option<&'a ForwarderDetection>,
    pub extracted_data: &'a Extraction,
}

#[async_trait]
pub trait ForwarderReplyProcessor: Send + Sync {
    async fn process(&self, request: ForwarderReplyRequest<'_>) -> AgentResult<ForwarderReply>;
}

/// Rate-request email drafted towards an assigned forwarder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRequestDraft {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Request shape for the forwarder email draft collaborator.
pub struct ForwarderDraftRequest<'a> {
    pub forwarder: &'a Forwarder,
    pub shipment_details: &'a ShipmentDetails,
    pub origin_country: &'a str,
    pub destination_country: &'a str,
    pub port_lookup: Option<&'a PortLookupOutcome>,
    pub thread_id: &'a str,
    pub sales_person: Option<&'a SalesPerson>,
    pub customer_email_content: &'a str,
}

#[async_trait]
pub trait ForwarderDraftComposer: Send + Sync {
    async fn process(&self, request: ForwarderDraftRequest<'_>) -> AgentResult<RateRequestDraft>;
}

/// Notification payload towards the sales team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesNotification {
    pub notification_type: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub urgency: Option<String>,
}

/// Request shape for the sales notification collaborator.
pub struct SalesNotifyRequest<'a> {
    pub notification_type: &'a str,
    pub customer_details: &'a ContactInformation,
    pub shipment_details: &'a ShipmentDetails,
    pub forwarder_rates: &'a [RateInfo],
    pub forwarder_details: &'a Value,
    pub timeline_information: &'a TimelineInformation,
    pub conversation_state: &'a str,
    pub thread_id: &'a str,
    pub urgency: &'a str,
}

#[async_trait]
pub trait SalesNotifier: Send + Sync {
    async fn process(&self, request: SalesNotifyRequest<'_>) -> AgentResult<SalesNotification>;
}

/// The full set of collaborators the orchestrator is wired with.
#[derive(Clone)]
pub struct AgentSet {
    pub classifier: Arc<dyn EmailClassifier>,
    pub conversation: Arc<dyn ConversationStateAgent>,
    pub thread_analyzer: Arc<dyn ThreadAnalyzer>,
    pub extractor: Arc<dyn InformationExtractor>,
    pub validator: Arc<dyn DataValidator>,
    pub port_lookup: Arc<dyn PortLookup>,
    pub container: Arc<dyn ContainerStandardizer>,
    pub rates: Arc<dyn RateRecommender>,
    pub next_action: Arc<dyn NextActionAgent>,
    pub clarification: Arc<dyn ClarificationGenerator>,
    pub confirmation: Arc<dyn ConfirmationGenerator>,
    pub acknowledgment: Arc<dyn AcknowledgmentGenerator>,
    pub confirmation_ack: Arc<dyn ConfirmationAckGenerator>,
    pub forwarder_detector: Arc<dyn ForwarderDetector>,
    pub forwarder_reply: Arc<dyn ForwarderReplyProcessor>,
    pub forwarder_draft: Arc<dyn ForwarderDraftComposer>,
    pub sales_notifier: Arc<dyn SalesNotifier>,
}
