//! Forwarder detection, reply parsing, and rate-request drafting

use async_trait::async_trait;
use regex::Regex;
use salesflow_workflow_engine::adapters::{
    AgentError, AgentResult, ForwarderDetectRequest, ForwarderDetection, ForwarderDetector,
    ForwarderDraftComposer, ForwarderDraftRequest, ForwarderReply, ForwarderReplyProcessor,
    ForwarderReplyRequest, RateInfo, RateRequestDraft,
};

/// Detects registered forwarders by sender address.
pub struct ForwarderDetectionAgent;

#[async_trait]
impl ForwarderDetector for ForwarderDetectionAgent {
    async fn process(
        &self,
        request: ForwarderDetectRequest<'_>,
    ) -> AgentResult<ForwarderDetection> {
        match request.registry.by_email(request.sender) {
            Some(forwarder) => Ok(ForwarderDetection {
                is_forwarder: true,
                forwarder: Some(forwarder.clone()),
            }),
            None => Ok(ForwarderDetection {
                is_forwarder: false,
                forwarder: None,
            }),
        }
    }
}

/// Parses rate facts out of a forwarder's reply text.
pub struct ForwarderResponseAgent {
    rate: Regex,
    rate_with_othc: Regex,
    rate_with_dthc: Regex,
    currency: Regex,
    transit: Regex,
    valid_until: Regex,
    sailing: Regex,
}

impl Default for ForwarderResponseAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::unwrap_used)] // patterns are fixed at compile time
fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap()
}

impl ForwarderResponseAgent {
    pub fn new() -> Self {
        Self {
            rate: pattern(r"(?i)\b(?:rate|price|cost)\s*[:\-]?\s*(?:USD\s*)?\$?\s*(\d[\d,]*)"),
            rate_with_othc: pattern(r"(?i)with\s+OTHC\s*[:\-]?\s*(?:USD\s*)?\$?\s*(\d[\d,]*)"),
            rate_with_dthc: pattern(r"(?i)with\s+DTHC\s*[:\-]?\s*(?:USD\s*)?\$?\s*(\d[\d,]*)"),
            currency: pattern(r"\b(USD|EUR|CNY|INR|AED|GBP)\b"),
            transit: pattern(r"(?i)\btransit(?:\s+time)?\s*[:\-]?\s*(\d{1,3})\s*days?"),
            valid_until: pattern(r"(?i)\bvalid\s+(?:until|till|through)\s*[:\-]?\s*([0-9]{4}-[0-9]{2}-[0-9]{2}|[A-Za-z]+\s+\d{1,2}(?:,\s*\d{4})?)"),
            sailing: pattern(r"(?i)\bsailing(?:\s+date)?\s*[:\-]?\s*([0-9]{4}-[0-9]{2}-[0-9]{2})"),
        }
    }

    fn capture(&self, re: &Regex, text: &str) -> Option<String> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    }
}

#[async_trait]
impl ForwarderReplyProcessor for ForwarderResponseAgent {
    async fn process(&self, request: ForwarderReplyRequest<'_>) -> AgentResult<ForwarderReply> {
        let (name, email) = match request.forwarder_info.and_then(|d| d.forwarder.as_ref()) {
            Some(forwarder) => (forwarder.name.clone(), forwarder.email.clone()),
            None => (
                request
                    .sender
                    .split('@')
                    .next()
                    .unwrap_or("Forwarder")
                    .to_string(),
                request.sender.to_string(),
            ),
        };

        let text = request.email_text;
        let rate_info = RateInfo {
            rate: self.capture(&self.rate, text),
            currency: self.capture(&self.currency, text).or(Some("USD".to_string())),
            rate_with_othc: self.capture(&self.rate_with_othc, text),
            rate_with_dthc: self.capture(&self.rate_with_dthc, text),
            transit_time: self.capture(&self.transit, text),
            valid_until: self.capture(&self.valid_until, text),
            sailing_date: self.capture(&self.sailing, text),
        };

        if !rate_info.has_rates() {
            tracing::warn!("forwarder reply carries no parsable rates");
        }
        Ok(ForwarderReply {
            forwarder_name: name,
            forwarder_email: email,
            rate_info,
        })
    }
}

/// Drafts the rate-request email towards an assigned forwarder.
pub struct ForwarderEmailDraftAgent;

#[async_trait]
impl ForwarderDraftComposer for ForwarderEmailDraftAgent {
    async fn process(&self, request: ForwarderDraftRequest<'_>) -> AgentResult<RateRequestDraft> {
        let shipment = request.shipment_details;
        let origin_raw = shipment
            .origin
            .as_deref()
            .ok_or_else(|| AgentError::new("rate request draft needs an origin"))?;
        let destination_raw = shipment
            .destination
            .as_deref()
            .ok_or_else(|| AgentError::new("rate request draft needs a destination"))?;
        let (origin, destination) = match request.port_lookup {
            Some(lookup) => (
                lookup.display_origin(origin_raw),
                lookup.display_destination(destination_raw),
            ),
            None => (origin_raw.to_string(), destination_raw.to_string()),
        };

        let from = request
            .sales_person
            .map(|p| p.email.clone())
            .unwrap_or_else(|| "sales-desk@salesflow.example".to_string());
        let subject = format!("Rate Request - {} to {}", origin, destination);

        let mut lines = vec![
            format!("Dear {},", request.forwarder.name),
            String::new(),
            "We have a confirmed shipment and would appreciate your best rates for the route below.".to_string(),
            String::new(),
            format!("- Origin: {} ({})", origin, request.origin_country),
            format!("- Destination: {} ({})", destination, request.destination_country),
        ];
        if let Some(container_type) = &shipment.container_type {
            lines.push(format!("- Container Type: {}", container_type));
        }
        if let Some(count) = &shipment.container_count {
            lines.push(format!("- Number of Containers: {}", count));
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
        if let Some(date) = &shipment.shipment_date {
            lines.push(format!("- Cargo Ready Date: {}", date));
        }
        if let Some(incoterm) = &shipment.incoterm {
            lines.push(format!("- Incoterm: {}", incoterm));
        }
        lines.push(String::new());
        lines.push(
            "Please include OTHC/DTHC breakdown, transit time, and rate validity.".to_string(),
        );
        lines.push(String::new());
        lines.push(format!("Reference: {}", request.thread_id));

        Ok(RateRequestDraft {
            to: request.forwarder.email.clone(),
            from,
            subject,
            body: lines.join("\n"),
        })
    }
}
