//! Freight-forwarder registry and route-based assignment

use crate::error::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A freight forwarder the sales desk can request rates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forwarder {
    pub name: String,
    pub country: String,
    pub operator: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
}

impl Forwarder {
    /// Company name, falling back to the forwarder name.
    pub fn company_name(&self) -> &str {
        self.company.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct ForwarderFile {
    #[serde(default)]
    forwarders: Vec<Forwarder>,
}

/// Registry of forwarders with country-keyed lookup.
///
/// Assignment policy: forwarders in the destination country beat
/// forwarders in the origin country, which beat any available forwarder.
#[derive(Debug, Default)]
pub struct ForwarderRegistry {
    forwarders: Vec<Forwarder>,
    by_country: BTreeMap<String, Vec<usize>>,
}

impl ForwarderRegistry {
    /// Build a registry from a list of forwarders.
    pub fn new(forwarders: Vec<Forwarder>) -> Self {
        let mut by_country: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, forwarder) in forwarders.iter().enumerate() {
            by_country
                .entry(forwarder.country.trim().to_string())
                .or_default()
                .push(index);
        }
        tracing::info!(
            forwarders = forwarders.len(),
            countries = by_country.len(),
            "forwarder registry loaded"
        );
        Self {
            forwarders,
            by_country,
        }
    }

    /// Load a registry from a JSON file with a top-level `forwarders` list.
    pub fn load(path: impl AsRef<Path>) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WorkflowError::Registry(format!("forwarder file: {}", e)))?;
        let file: ForwarderFile = serde_json::from_str(&content)
            .map_err(|e| WorkflowError::Registry(format!("forwarder file: {}", e)))?;
        Ok(Self::new(file.forwarders))
    }

    /// Built-in registry used when no forwarder file is configured.
    pub fn default_registry() -> Self {
        Self::new(vec![
            Forwarder {
                name: "Pacific Bridge Logistics".to_string(),
                country: "USA".to_string(),
                operator: "Maersk".to_string(),
                email: "rates@pacificbridge.example".to_string(),
                company: Some("Pacific Bridge Logistics LLC".to_string()),
            },
            Forwarder {
                name: "Dragon Gate Freight".to_string(),
                country: "China".to_string(),
                operator: "COSCO".to_string(),
                email: "quotes@dragongate.example".to_string(),
                company: Some("Dragon Gate Freight Co".to_string()),
            },
            Forwarder {
                name: "Hanse Cargo Partners".to_string(),
                country: "Germany".to_string(),
                operator: "Hapag-Lloyd".to_string(),
                email: "pricing@hansecargo.example".to_string(),
                company: None,
            },
            Forwarder {
                name: "Sagar Shipping Services".to_string(),
                country: "India".to_string(),
                operator: "MSC".to_string(),
                email: "rates@sagarshipping.example".to_string(),
                company: None,
            },
        ])
    }

    /// Forwarders registered for a country.
    pub fn by_country(&self, country: &str) -> Vec<&Forwarder> {
        self.by_country
            .get(country.trim())
            .map(|indices| indices.iter().map(|&i| &self.forwarders[i]).collect())
            .unwrap_or_default()
    }

    /// Assign a forwarder for a route.
    ///
    /// Destination-country matches beat origin-country matches, which beat
    /// any available forwarder. Returns `None` when the registry is empty.
    pub fn assign_for_route(
        &self,
        origin_country: &str,
        destination_country: &str,
    ) -> Option<&Forwarder> {
        if let Some(forwarder) = self.by_country(destination_country).first() {
            tracing::info!(forwarder = %forwarder.name, "assigned forwarder from destination country");
            return Some(forwarder);
        }
        if let Some(forwarder) = self.by_country(origin_country).first() {
            tracing::info!(forwarder = %forwarder.name, "assigned forwarder from origin country");
            return Some(forwarder);
        }
        let fallback = self.forwarders.first();
        if let Some(forwarder) = fallback {
            tracing::info!(forwarder = %forwarder.name, "assigned fallback forwarder");
        } else {
            tracing::warn!(
                origin = origin_country,
                destination = destination_country,
                "no forwarder available for route"
            );
        }
        fallback
    }

    /// Look up a forwarder by its email address, case-insensitively.
    pub fn by_email(&self, email: &str) -> Option<&Forwarder> {
        let email = email.trim().to_lowercase();
        self.forwarders
            .iter()
            .find(|f| f.email.trim().to_lowercase() == email)
    }

    /// True when the address belongs to a registered forwarder.
    pub fn is_forwarder_email(&self, email: &str) -> bool {
        self.by_email(email).is_some()
    }

    /// All registered forwarders.
    pub fn all(&self) -> &[Forwarder] {
        &self.forwarders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_country_beats_origin_country() {
        let registry = ForwarderRegistry::default_registry();
        let assigned = registry.assign_for_route("China", "USA").unwrap();
        assert_eq!(assigned.country, "USA");
    }

    #[test]
    fn origin_country_used_when_destination_has_none() {
        let registry = ForwarderRegistry::default_registry();
        let assigned = registry.assign_for_route("China", "Atlantis").unwrap();
        assert_eq!(assigned.country, "China");
    }

    #[test]
    fn fallback_when_neither_country_matches() {
        let registry = ForwarderRegistry::default_registry();
        let assigned = registry.assign_for_route("Mordor", "Atlantis").unwrap();
        assert_eq!(assigned.name, "Pacific Bridge Logistics");
    }

    #[test]
    fn empty_registry_assigns_nothing() {
        let registry = ForwarderRegistry::new(Vec::new());
        assert!(registry.assign_for_route("China", "USA").is_none());
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let registry = ForwarderRegistry::default_registry();
        assert!(registry.is_forwarder_email("RATES@PACIFICBRIDGE.EXAMPLE"));
        assert!(!registry.is_forwarder_email("someone@else.example"));
    }
}
