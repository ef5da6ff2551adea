//! Typed extraction categories shared by every email in a thread
//!
//! Empty strings are parsed to the absent state at ingress, so the merge
//! engine and the validator never have to re-check emptiness.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deserialize an optional string, mapping empty or blank values to `None`.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(normalize_field))
}

/// Normalize a field value: trimmed, empty collapses to `None`.
pub fn normalize_field(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Full container load vs less-than-container load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShipmentType {
    #[serde(rename = "FCL")]
    Fcl,
    #[serde(rename = "LCL")]
    Lcl,
}

impl ShipmentType {
    /// Parse a free-form value, upper-casing before comparison.
    /// Anything other than `FCL`/`LCL` is treated as "not stated".
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "FCL" => Some(ShipmentType::Fcl),
            "LCL" => Some(ShipmentType::Lcl),
            _ => None,
        }
    }
}

impl fmt::Display for ShipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentType::Fcl => write!(f, "FCL"),
            ShipmentType::Lcl => write!(f, "LCL"),
        }
    }
}

impl<'de> Deserialize<'de> for ShipmentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        ShipmentType::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown shipment type: {}", value)))
    }
}

fn shipment_type_opt<'de, D>(deserializer: D) -> Result<Option<ShipmentType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(ShipmentType::parse))
}

/// Shipment facts extracted from emails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub origin: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub origin_country: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub destination_country: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub container_type: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub container_count: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub commodity: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "shipment_type_opt")]
    pub shipment_type: Option<ShipmentType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub shipment_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub incoterm: Option<String>,
}

impl ShipmentDetails {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.destination.is_none()
            && self.origin_country.is_none()
            && self.destination_country.is_none()
            && self.container_type.is_none()
            && self.container_count.is_none()
            && self.commodity.is_none()
            && self.weight.is_none()
            && self.volume.is_none()
            && self.shipment_type.is_none()
            && self.shipment_date.is_none()
            && self.incoterm.is_none()
    }
}

/// Customer contact facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInformation {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub whatsapp: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub company: Option<String>,
}

impl ContactInformation {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.whatsapp.is_none()
            && self.company.is_none()
    }
}

/// Timing facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineInformation {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub requested_dates: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub transit_time: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub urgency: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub deadline: Option<String>,
}

impl TimelineInformation {
    pub fn is_empty(&self) -> bool {
        self.requested_dates.is_none()
            && self.transit_time.is_none()
            && self.urgency.is_none()
            && self.deadline.is_none()
    }
}

/// The cumulative extraction of a thread, or the per-email extraction of
/// one inbound email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub shipment_details: ShipmentDetails,
    #[serde(default)]
    pub contact_information: ContactInformation,
    #[serde(default)]
    pub timeline_information: TimelineInformation,
    /// Ordered sequence with set semantics for deduplication
    #[serde(default)]
    pub special_requirements: Vec<String>,
    /// Free keys, recency-merged by key
    #[serde(default)]
    pub rate_information: BTreeMap<String, String>,
    /// Free text, line-wise unioned across emails
    #[serde(default, deserialize_with = "empty_as_none")]
    pub additional_notes: Option<String>,
}

impl Extraction {
    /// True when no category carries any value.
    pub fn is_empty(&self) -> bool {
        self.shipment_details.is_empty()
            && self.contact_information.is_empty()
            && self.timeline_information.is_empty()
            && self.special_requirements.is_empty()
            && self.rate_information.is_empty()
            && self.additional_notes.is_none()
    }

    /// Shipment date, falling back to the requested dates of the timeline
    /// category when `shipment_details.shipment_date` was never stated.
    pub fn effective_shipment_date(&self) -> Option<&str> {
        self.shipment_details
            .shipment_date
            .as_deref()
            .or(self.timeline_information.requested_dates.as_deref())
    }

    /// Shipment type, considering the explicit field first and explicit
    /// FCL/LCL mentions in the special requirements second.
    pub fn effective_shipment_type(&self) -> Option<ShipmentType> {
        if let Some(st) = self.shipment_details.shipment_type {
            return Some(st);
        }
        let requirements = self.special_requirements.join(" ").to_lowercase();
        if requirements.contains("lcl") || requirements.contains("less than container") {
            Some(ShipmentType::Lcl)
        } else if requirements.contains("fcl") || requirements.contains("full container") {
            Some(ShipmentType::Fcl)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_deserialize_to_absent() {
        let extraction: Extraction = serde_json::from_str(
            r#"{"shipment_details": {"origin": "", "destination": "Los Angeles", "weight": "  "}}"#,
        )
        .unwrap();
        assert_eq!(extraction.shipment_details.origin, None);
        assert_eq!(
            extraction.shipment_details.destination.as_deref(),
            Some("Los Angeles")
        );
        assert_eq!(extraction.shipment_details.weight, None);
    }

    #[test]
    fn unknown_shipment_type_is_absent() {
        let details: ShipmentDetails =
            serde_json::from_str(r#"{"shipment_type": "groupage"}"#).unwrap();
        assert_eq!(details.shipment_type, None);

        let details: ShipmentDetails = serde_json::from_str(r#"{"shipment_type": "lcl"}"#).unwrap();
        assert_eq!(details.shipment_type, Some(ShipmentType::Lcl));
    }

    #[test]
    fn effective_type_reads_special_requirements() {
        let mut extraction = Extraction::default();
        assert_eq!(extraction.effective_shipment_type(), None);

        extraction
            .special_requirements
            .push("LCL consolidation preferred".to_string());
        assert_eq!(
            extraction.effective_shipment_type(),
            Some(ShipmentType::Lcl)
        );
    }

    #[test]
    fn effective_date_falls_back_to_requested_dates() {
        let mut extraction = Extraction::default();
        extraction.timeline_information.requested_dates = Some("2024-03-15".to_string());
        assert_eq!(extraction.effective_shipment_date(), Some("2024-03-15"));

        extraction.shipment_details.shipment_date = Some("2024-04-01".to_string());
        assert_eq!(extraction.effective_shipment_date(), Some("2024-04-01"));
    }
}
