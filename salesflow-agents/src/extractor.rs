//! Rule-based information extraction
//!
//! Reads labeled lines (`Origin: Shanghai`) and common prose patterns
//! (`ship from Shanghai to Los Angeles`, `2 x 40HC`, `20,000 kg`) into
//! the structured extraction categories. Locations recognized as
//! country names land in the country fields, not the port fields.

use crate::ports::{classify, Location};
use async_trait::async_trait;
use regex::Regex;
use salesflow_workflow_engine::adapters::{
    AgentResult, ExtractRequest, ExtractionOutcome, InformationExtractor,
};
use salesflow_workflow_engine::extraction::{Extraction, ShipmentType};

/// Compiled pattern set; built once per agent.
pub struct InformationExtractionAgent {
    labeled_origin: Regex,
    labeled_destination: Regex,
    labeled_commodity: Regex,
    labeled_weight: Regex,
    labeled_volume: Regex,
    labeled_container: Regex,
    labeled_date: Regex,
    labeled_notes: Regex,
    labeled_requirements: Regex,
    prose_route: Regex,
    container_with_count: Regex,
    container_token: Regex,
    count_of_containers: Regex,
    weight_value: Regex,
    volume_value: Regex,
    iso_date: Regex,
    incoterm: Regex,
    phone: Regex,
}

impl Default for InformationExtractionAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// A labeled line like `Origin: Shanghai` or `- Weight: 20,000 kg`.
#[allow(clippy::unwrap_used)] // patterns are fixed at compile time
fn labeled(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[\s>*•-]*{}\s*[:\-]\s*(\S.*?)\s*$",
        label
    ))
    .unwrap()
}

#[allow(clippy::unwrap_used)] // patterns are fixed at compile time
fn pattern(re: &str) -> Regex {
    Regex::new(re).unwrap()
}

impl InformationExtractionAgent {
    pub fn new() -> Self {
        Self {
            labeled_origin: labeled(r"origin(?:\s+port)?"),
            labeled_destination: labeled(r"destination(?:\s+port)?"),
            labeled_commodity: labeled(r"(?:commodity|cargo|goods)"),
            labeled_weight: labeled(r"(?:gross\s+)?weight"),
            labeled_volume: labeled(r"volume"),
            labeled_container: labeled(r"containers?(?:\s+type)?"),
            labeled_date: labeled(r"(?:ready\s+date|shipment\s+date|cargo\s+ready(?:\s+date)?|etd)"),
            labeled_notes: labeled(r"notes?"),
            labeled_requirements: labeled(r"special\s+requirements?"),
            // Locations are capitalized words; keeping the captures
            // case-sensitive stops them from swallowing trailing prose.
            prose_route: pattern(
                r"\b[Ff]rom\s+([A-Z][A-Za-z'\-]*(?:\s+[A-Z][A-Za-z'\-]*){0,3})\s+[Tt]o\s+([A-Z][A-Za-z'\-]*(?:\s+[A-Z][A-Za-z'\-]*){0,3})",
            ),
            container_with_count: pattern(
                r"(?i)\b(\d{1,3})\s*(?:x|\*)\s*(20\s?GP|40\s?GP|40\s?HC|40\s?HQ|45\s?HC|20\s?FT|40\s?FT)\b",
            ),
            container_token: pattern(r"(?i)\b(20\s?GP|40\s?GP|40\s?HC|40\s?HQ|45\s?HC|20\s?FT|40\s?FT)\b"),
            count_of_containers: pattern(r"(?i)\b(\d{1,3})\s+containers?\b"),
            weight_value: pattern(r"(?i)\b(\d[\d,.]*\s*(?:kg|kgs|kilograms|tons?|mt))\b"),
            volume_value: pattern(r"(?i)\b(\d[\d,.]*\s*(?:cbm|m3|m³|cubic\s+meters?))\b"),
            iso_date: pattern(r"\b(\d{4}-\d{2}-\d{2})\b"),
            incoterm: pattern(r"\b(FOB|CIF|CFR|EXW|DDP|DAP|FCA|CPT|CIP|DPU|FAS)\b"),
            phone: pattern(r"(?i)(?:phone|tel|mobile|call me at)\s*[:\-]?\s*(\+?[\d][\d\s().\-]{6,18}\d)"),
        }
    }

    fn first_capture(&self, re: &Regex, text: &str) -> Option<String> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Record a location into the port field or the country field,
    /// depending on what the name resolves to.
    fn record_location(name: &str, port_field: &mut Option<String>, country_field: &mut Option<String>) {
        match classify(name) {
            Location::Country(country) => *country_field = Some(country),
            Location::Port { name, country, .. } => {
                *port_field = Some(name);
                country_field.get_or_insert(country);
            }
            Location::Unknown => *port_field = Some(name.trim().to_string()),
        }
    }
}

#[async_trait]
impl InformationExtractor for InformationExtractionAgent {
    async fn process(&self, request: ExtractRequest<'_>) -> AgentResult<ExtractionOutcome> {
        let text = request.email_text;
        let mut extraction = Extraction::default();
        let shipment = &mut extraction.shipment_details;

        // Labeled lines win; prose patterns only fill what is left.
        if let Some(origin) = self.first_capture(&self.labeled_origin, text) {
            Self::record_location(&origin, &mut shipment.origin, &mut shipment.origin_country);
        }
        if let Some(destination) = self.first_capture(&self.labeled_destination, text) {
            Self::record_location(
                &destination,
                &mut shipment.destination,
                &mut shipment.destination_country,
            );
        }
        if shipment.origin.is_none() && shipment.origin_country.is_none()
            || shipment.destination.is_none() && shipment.destination_country.is_none()
        {
            if let Some(captures) = self.prose_route.captures(text) {
                if let (Some(from), Some(to)) = (captures.get(1), captures.get(2)) {
                    if shipment.origin.is_none() && shipment.origin_country.is_none() {
                        Self::record_location(
                            from.as_str(),
                            &mut shipment.origin,
                            &mut shipment.origin_country,
                        );
                    }
                    if shipment.destination.is_none() && shipment.destination_country.is_none() {
                        Self::record_location(
                            to.as_str(),
                            &mut shipment.destination,
                            &mut shipment.destination_country,
                        );
                    }
                }
            }
        }

        if let Some(captures) = self.container_with_count.captures(text) {
            shipment.container_count = captures.get(1).map(|m| m.as_str().to_string());
            shipment.container_type = captures
                .get(2)
                .map(|m| m.as_str().to_uppercase().replace(' ', ""));
        } else {
            if let Some(line) = self.first_capture(&self.labeled_container, text) {
                if let Some(captures) = self.container_with_count.captures(&line) {
                    shipment.container_count = captures.get(1).map(|m| m.as_str().to_string());
                    shipment.container_type = captures
                        .get(2)
                        .map(|m| m.as_str().to_uppercase().replace(' ', ""));
                } else if let Some(token) = self.first_capture(&self.container_token, &line) {
                    shipment.container_type = Some(token.to_uppercase().replace(' ', ""));
                }
            }
            if shipment.container_type.is_none() {
                if let Some(token) = self.first_capture(&self.container_token, text) {
                    shipment.container_type = Some(token.to_uppercase().replace(' ', ""));
                }
            }
            if shipment.container_count.is_none() {
                shipment.container_count = self.first_capture(&self.count_of_containers, text);
            }
        }

        shipment.commodity = self.first_capture(&self.labeled_commodity, text);
        shipment.weight = self
            .first_capture(&self.labeled_weight, text)
            .or_else(|| self.first_capture(&self.weight_value, text));
        shipment.volume = self
            .first_capture(&self.labeled_volume, text)
            .or_else(|| self.first_capture(&self.volume_value, text));
        shipment.shipment_date = self
            .first_capture(&self.labeled_date, text)
            .or_else(|| self.first_capture(&self.iso_date, text));
        shipment.incoterm = self
            .first_capture(&self.incoterm, text)
            .map(|t| t.to_uppercase());

        let lowered = text.to_lowercase();
        if lowered.contains("lcl") || lowered.contains("less than container") {
            shipment.shipment_type = Some(ShipmentType::Lcl);
        } else if lowered.contains("fcl") || lowered.contains("full container") {
            shipment.shipment_type = Some(ShipmentType::Fcl);
        }

        extraction.timeline_information.requested_dates =
            extraction.shipment_details.shipment_date.clone();

        extraction.contact_information.email = Some(request.sender.trim().to_string());
        extraction.contact_information.phone = self.first_capture(&self.phone, text);

        if let Some(requirements) = self.first_capture(&self.labeled_requirements, text) {
            extraction.special_requirements = requirements
                .split(&[',', ';'][..])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        extraction.additional_notes = self.first_capture(&self.labeled_notes, text);

        let shipment = &extraction.shipment_details;
        let found = [
            shipment.origin.is_some() || shipment.origin_country.is_some(),
            shipment.destination.is_some() || shipment.destination_country.is_some(),
            shipment.container_type.is_some() || shipment.weight.is_some(),
            shipment.commodity.is_some(),
            shipment.shipment_date.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count();
        let quality_score = found as f64 / 5.0;
        let confidence = match found {
            0 => 0.3,
            1 | 2 => 0.6,
            _ => 0.9,
        };

        tracing::debug!(quality_score, confidence, "extraction finished");
        Ok(ExtractionOutcome {
            extracted_data: extraction,
            quality_score,
            confidence,
        })
    }
}
