//! Mandatory-field validation and priority ordering of missing fields
//!
//! The validator inspects the merged (cumulative) extraction, never the
//! per-email extraction, and gates the confirmation and confirmation-
//! acknowledgment responses: neither may be emitted while any mandatory
//! field is missing.

use crate::adapters::PortLookupOutcome;
use crate::extraction::{Extraction, ShipmentType};

/// Human-readable labels used in missing-fields lists.
pub mod labels {
    pub const ORIGIN: &str = "Origin";
    pub const ORIGIN_PORT_REQUIRED: &str = "Origin (specific port required)";
    pub const DESTINATION: &str = "Destination";
    pub const DESTINATION_PORT_REQUIRED: &str = "Destination (specific port required)";
    pub const SHIPMENT_TYPE: &str = "Shipment Type (FCL or LCL)";
    pub const CONTAINER_TYPE: &str = "Container Type";
    pub const QUANTITY: &str = "Quantity (number of containers)";
    pub const WEIGHT: &str = "Weight";
    pub const VOLUME: &str = "Volume";
    pub const WEIGHT_WITH_VOLUME: &str = "Weight (required with volume for LCL)";
    pub const VOLUME_WITH_WEIGHT: &str = "Volume (required with weight for LCL)";
    pub const SHIPMENT_DATE: &str = "Shipment Date";
    pub const COMMODITY: &str = "Commodity Name";
}

/// Validate the mandatory fields for a confirmation.
///
/// Returns `(ok, missing)` where `ok` is true exactly when `missing` is
/// empty. The list is produced in the stable order used both for routing
/// and for clarification phrasing. An absent port lookup degrades to
/// "not a country".
pub fn validate_for_confirmation(
    extraction: &Extraction,
    port_lookup: Option<&PortLookupOutcome>,
) -> (bool, Vec<String>) {
    let mut missing: Vec<String> = Vec::new();
    let shipment = &extraction.shipment_details;

    // Priority 1: origin and destination must be specific ports.
    match &shipment.origin {
        None if shipment.origin_country.is_some() => {
            missing.push(labels::ORIGIN_PORT_REQUIRED.to_string());
        }
        None => missing.push(labels::ORIGIN.to_string()),
        Some(_) => {
            let is_country = port_lookup
                .and_then(|p| p.origin.as_ref())
                .map(|info| info.is_country)
                .unwrap_or(false);
            if is_country {
                missing.push(labels::ORIGIN_PORT_REQUIRED.to_string());
            }
        }
    }
    match &shipment.destination {
        None if shipment.destination_country.is_some() => {
            missing.push(labels::DESTINATION_PORT_REQUIRED.to_string());
        }
        None => missing.push(labels::DESTINATION.to_string()),
        Some(_) => {
            let is_country = port_lookup
                .and_then(|p| p.destination.as_ref())
                .map(|info| info.is_country)
                .unwrap_or(false);
            if is_country {
                missing.push(labels::DESTINATION_PORT_REQUIRED.to_string());
            }
        }
    }

    let shipment_date = extraction.effective_shipment_date();
    let commodity = shipment.commodity.as_deref();

    match extraction.effective_shipment_type() {
        None => {
            // Type unknown: ask for the type and for everything that
            // depends on it. No assumption is made from a container type
            // alone.
            missing.push(labels::SHIPMENT_TYPE.to_string());
            if shipment.container_type.is_none() {
                missing.push(labels::CONTAINER_TYPE.to_string());
            }
            missing.push(labels::WEIGHT.to_string());
            missing.push(labels::VOLUME.to_string());
            if shipment_date.is_none() {
                missing.push(labels::SHIPMENT_DATE.to_string());
            }
            if commodity.is_none() {
                missing.push(labels::COMMODITY.to_string());
            }
        }
        Some(ShipmentType::Fcl) => {
            if shipment.container_type.is_none() {
                missing.push(labels::CONTAINER_TYPE.to_string());
            }
            if shipment_date.is_none() {
                missing.push(labels::SHIPMENT_DATE.to_string());
            }
            if commodity.is_none() {
                missing.push(labels::COMMODITY.to_string());
            }
            if shipment.container_count.is_none() {
                missing.push(labels::QUANTITY.to_string());
            }
        }
        Some(ShipmentType::Lcl) => {
            match (&shipment.weight, &shipment.volume) {
                (None, None) => {
                    missing.push(labels::WEIGHT.to_string());
                    missing.push(labels::VOLUME.to_string());
                }
                (Some(_), None) => missing.push(labels::VOLUME_WITH_WEIGHT.to_string()),
                (None, Some(_)) => missing.push(labels::WEIGHT_WITH_VOLUME.to_string()),
                (Some(_), Some(_)) => {}
            }
            if shipment_date.is_none() {
                missing.push(labels::SHIPMENT_DATE.to_string());
            }
            if commodity.is_none() {
                missing.push(labels::COMMODITY.to_string());
            }
            // Container fields must never be asked for on LCL. The branch
            // above cannot add them; this pass guards against accidental
            // entries regardless of where they came from.
            missing.retain(|field| !field.to_lowercase().contains("container"));
        }
    }

    (missing.is_empty(), missing)
}

/// Priority table for missing-fields ordering. Lower is more urgent.
const PRIORITY_TABLE: [(&str, u8); 15] = [
    ("origin", 1),
    ("destination", 1),
    ("container_type", 2),
    ("container_count", 2),
    ("requested_dates", 2),
    ("shipment_date", 2),
    ("commodity", 3),
    ("weight", 3),
    ("volume", 3),
    ("name", 4),
    ("email", 4),
    ("phone", 4),
    ("company", 4),
    ("contact_information", 4),
    ("special_requirements", 4),
];

fn field_priority(field: &str) -> u8 {
    let field = field.to_lowercase();
    let normalized = field.replace(' ', "_");
    for (key, priority) in PRIORITY_TABLE {
        if normalized == key {
            return priority;
        }
    }
    for (key, priority) in PRIORITY_TABLE {
        if normalized.contains(key) || key.contains(normalized.as_str()) {
            return priority;
        }
    }
    99
}

/// Sort a missing-fields list by the priority table, stably; ties within
/// a priority break alphabetically. Matching is case-insensitive and
/// accepts substring matches in either direction.
pub fn prioritize_missing_fields(missing_fields: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = missing_fields.to_vec();
    sorted.sort_by(|a, b| {
        field_priority(a)
            .cmp(&field_priority(b))
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    });
    sorted
}
