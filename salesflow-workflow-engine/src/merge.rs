//! Recency-priority merge of per-email extractions into the cumulative
//! thread extraction
//!
//! Non-empty new values overwrite old ones; absent values never delete.
//! The shipment-type branch is the one exception: declaring LCL removes
//! the container fields, declaring FCL drops weight/volume unless the new
//! extraction carries them.

use crate::extraction::{
    ContactInformation, Extraction, ShipmentDetails, ShipmentType, TimelineInformation,
};
use std::collections::BTreeMap;

/// Boilerplate phrases dropped from merged additional notes.
const NOTES_DENYLIST: [&str; 4] = [
    "please provide the updated quote",
    "please provide these details",
    "please provide the correct details",
    "please provide it in your response",
];

/// Merge a per-email extraction into the cumulative extraction.
///
/// The result equals `cumulative` with every field taken from `new` if and
/// only if the new value is present. An empty cumulative is replaced by
/// `new` wholesale.
pub fn merge_with_recency_priority(new: &Extraction, cumulative: &Extraction) -> Extraction {
    if cumulative.is_empty() {
        tracing::debug!("no cumulative data, using new extraction as base");
        return prune_for_shipment_type(new.clone());
    }

    let merged = Extraction {
        shipment_details: merge_shipment_details(
            &new.shipment_details,
            &cumulative.shipment_details,
        ),
        contact_information: merge_contact_information(
            &new.contact_information,
            &cumulative.contact_information,
        ),
        timeline_information: merge_timeline_information(
            &new.timeline_information,
            &cumulative.timeline_information,
        ),
        special_requirements: merge_special_requirements(
            &new.special_requirements,
            &cumulative.special_requirements,
        ),
        rate_information: merge_rate_information(&new.rate_information, &cumulative.rate_information),
        additional_notes: merge_additional_notes(
            new.additional_notes.as_deref(),
            cumulative.additional_notes.as_deref(),
        ),
    };
    tracing::debug!("merge completed");
    merged
}

fn take_recent(merged: &mut Option<String>, new: &Option<String>) {
    if new.is_some() {
        *merged = new.clone();
    }
}

/// Shipment details carry the one legitimate deletion rule: a shipment
/// type declared by the new extraction invalidates fields of the other
/// mode.
fn merge_shipment_details(new: &ShipmentDetails, cumulative: &ShipmentDetails) -> ShipmentDetails {
    let mut merged = cumulative.clone();

    take_recent(&mut merged.origin, &new.origin);
    take_recent(&mut merged.destination, &new.destination);
    take_recent(&mut merged.origin_country, &new.origin_country);
    take_recent(&mut merged.destination_country, &new.destination_country);
    take_recent(&mut merged.container_type, &new.container_type);
    take_recent(&mut merged.container_count, &new.container_count);
    take_recent(&mut merged.commodity, &new.commodity);
    take_recent(&mut merged.weight, &new.weight);
    take_recent(&mut merged.volume, &new.volume);
    take_recent(&mut merged.shipment_date, &new.shipment_date);
    take_recent(&mut merged.incoterm, &new.incoterm);

    match new.shipment_type {
        Some(ShipmentType::Lcl) => {
            merged.shipment_type = Some(ShipmentType::Lcl);
            if merged.container_type.take().is_some() | merged.container_count.take().is_some() {
                tracing::debug!("cleared container fields for LCL shipment");
            }
        }
        Some(ShipmentType::Fcl) => {
            merged.shipment_type = Some(ShipmentType::Fcl);
            if new.weight.is_none() {
                merged.weight = None;
            }
            if new.volume.is_none() {
                merged.volume = None;
            }
        }
        None => {}
    }

    merged
}

/// Apply the shipment-type pruning to a standalone extraction. Used when
/// the cumulative record is empty and `new` becomes the base.
fn prune_for_shipment_type(mut extraction: Extraction) -> Extraction {
    if extraction.shipment_details.shipment_type == Some(ShipmentType::Lcl) {
        extraction.shipment_details.container_type = None;
        extraction.shipment_details.container_count = None;
    }
    extraction
}

fn merge_contact_information(
    new: &ContactInformation,
    cumulative: &ContactInformation,
) -> ContactInformation {
    let mut merged = cumulative.clone();
    take_recent(&mut merged.name, &new.name);
    take_recent(&mut merged.email, &new.email);
    take_recent(&mut merged.phone, &new.phone);
    take_recent(&mut merged.whatsapp, &new.whatsapp);
    take_recent(&mut merged.company, &new.company);
    merged
}

fn merge_timeline_information(
    new: &TimelineInformation,
    cumulative: &TimelineInformation,
) -> TimelineInformation {
    let mut merged = cumulative.clone();
    take_recent(&mut merged.requested_dates, &new.requested_dates);
    take_recent(&mut merged.transit_time, &new.transit_time);
    take_recent(&mut merged.urgency, &new.urgency);
    take_recent(&mut merged.deadline, &new.deadline);
    merged
}

/// Ordered union: new requirements are appended when not already present
/// by exact match.
fn merge_special_requirements(new: &[String], cumulative: &[String]) -> Vec<String> {
    let mut merged = cumulative.to_vec();
    for requirement in new {
        if !requirement.trim().is_empty() && !merged.contains(requirement) {
            merged.push(requirement.clone());
        }
    }
    merged
}

fn merge_rate_information(
    new: &BTreeMap<String, String>,
    cumulative: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = cumulative.clone();
    for (key, value) in new {
        if !value.trim().is_empty() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Line-wise union of the free-text notes, dropping blanks and the
/// boilerplate denylist. When everything is filtered out, the new value
/// wins so the category is never silently emptied.
fn merge_additional_notes(new: Option<&str>, cumulative: Option<&str>) -> Option<String> {
    let new = new.map(str::trim).filter(|s| !s.is_empty());
    let cumulative = cumulative.map(str::trim).filter(|s| !s.is_empty());

    let (new, cumulative) = match (new, cumulative) {
        (None, cumulative) => return cumulative.map(str::to_string),
        (new, None) => return new.map(str::to_string),
        (Some(new), Some(cumulative)) => (new, cumulative),
    };

    let mut lines: Vec<&str> = Vec::new();
    for line in cumulative.lines().chain(new.lines()) {
        let line = line.trim();
        if line.is_empty() || lines.contains(&line) {
            continue;
        }
        let lowered = line.to_lowercase();
        if NOTES_DENYLIST.iter().any(|phrase| lowered.contains(phrase)) {
            continue;
        }
        lines.push(line);
    }

    if lines.is_empty() {
        Some(new.to_string())
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipment(origin: Option<&str>, weight: Option<&str>) -> Extraction {
        Extraction {
            shipment_details: ShipmentDetails {
                origin: origin.map(str::to_string),
                weight: weight.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn absent_value_is_no_update() {
        let cumulative = shipment(Some("Shanghai"), Some("20,000 kg"));
        let new = shipment(None, None);
        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(merged.shipment_details.origin.as_deref(), Some("Shanghai"));
        assert_eq!(
            merged.shipment_details.weight.as_deref(),
            Some("20,000 kg")
        );
    }

    #[test]
    fn recent_value_overwrites() {
        let cumulative = shipment(Some("Shanghai"), None);
        let new = shipment(Some("Ningbo"), None);
        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(merged.shipment_details.origin.as_deref(), Some("Ningbo"));
    }

    #[test]
    fn lcl_clears_container_fields() {
        let mut cumulative = shipment(Some("Shanghai"), None);
        cumulative.shipment_details.container_type = Some("40HC".to_string());
        cumulative.shipment_details.container_count = Some("2".to_string());

        let mut new = Extraction::default();
        new.shipment_details.shipment_type = Some(ShipmentType::Lcl);
        // Even a container type arriving together with LCL must not survive.
        new.shipment_details.container_type = Some("20GP".to_string());

        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(
            merged.shipment_details.shipment_type,
            Some(ShipmentType::Lcl)
        );
        assert_eq!(merged.shipment_details.container_type, None);
        assert_eq!(merged.shipment_details.container_count, None);
        assert_eq!(merged.shipment_details.origin.as_deref(), Some("Shanghai"));
    }

    #[test]
    fn fcl_drops_weight_unless_new_carries_it() {
        let cumulative = shipment(None, Some("20,000 kg"));
        let mut new = Extraction::default();
        new.shipment_details.shipment_type = Some(ShipmentType::Fcl);
        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(merged.shipment_details.weight, None);

        let mut new = Extraction::default();
        new.shipment_details.shipment_type = Some(ShipmentType::Fcl);
        new.shipment_details.weight = Some("18,000 kg".to_string());
        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(
            merged.shipment_details.weight.as_deref(),
            Some("18,000 kg")
        );
    }

    #[test]
    fn special_requirements_union_keeps_order_and_dedups() {
        let mut cumulative = Extraction::default();
        cumulative.special_requirements = vec!["fumigation".to_string()];
        let mut new = Extraction::default();
        new.special_requirements = vec!["fumigation".to_string(), "tail lift".to_string()];

        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(merged.special_requirements, vec!["fumigation", "tail lift"]);
    }

    #[test]
    fn additional_notes_filters_boilerplate() {
        let mut cumulative = Extraction::default();
        cumulative.additional_notes = Some("Cargo is palletized".to_string());
        let mut new = Extraction::default();
        new.additional_notes =
            Some("Please provide the updated quote\nDelivery to warehouse door".to_string());

        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(
            merged.additional_notes.as_deref(),
            Some("Cargo is palletized\nDelivery to warehouse door")
        );
    }

    #[test]
    fn additional_notes_falls_back_to_new_when_all_filtered() {
        let mut cumulative = Extraction::default();
        cumulative.additional_notes = Some("please provide these details".to_string());
        let mut new = Extraction::default();
        new.additional_notes = Some("Please provide the updated quote".to_string());

        let merged = merge_with_recency_priority(&new, &cumulative);
        assert_eq!(
            merged.additional_notes.as_deref(),
            Some("Please provide the updated quote")
        );
    }

    #[test]
    fn empty_cumulative_takes_new_with_pruning() {
        let mut new = Extraction::default();
        new.shipment_details.shipment_type = Some(ShipmentType::Lcl);
        new.shipment_details.container_type = Some("40HC".to_string());
        let merged = merge_with_recency_priority(&new, &Extraction::default());
        assert_eq!(merged.shipment_details.container_type, None);
    }
}
