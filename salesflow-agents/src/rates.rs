//! Market rate recommendation (FCL)

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AgentResult, RateRecommendation, RateRecommender, RateRequest,
};
use std::collections::BTreeMap;

/// Indicative market bands in USD per container: route, type, low, high.
const MARKET_TABLE: &[(&str, &str, &str, u32, u32)] = &[
    ("CNSHA", "USLAX", "40HC", 2400, 3100),
    ("CNSHA", "USLAX", "40GP", 2100, 2800),
    ("CNSHA", "USLAX", "20GP", 1500, 1900),
    ("CNSHA", "NLRTM", "40HC", 2000, 2600),
    ("CNSHA", "NLRTM", "20GP", 1200, 1600),
    ("CNSZX", "USLAX", "40HC", 2450, 3150),
    ("INNSA", "NLRTM", "40HC", 1700, 2200),
    ("INNSA", "AEJEA", "20GP", 600, 850),
];

/// Generic bands used when no route entry exists.
const GENERIC_BANDS: &[(&str, u32, u32)] = &[
    ("20GP", 1200, 1800),
    ("40GP", 1800, 2600),
    ("40HC", 2000, 2900),
    ("45HC", 2300, 3200),
    ("40RF", 4000, 5500),
];

/// Deterministic rate recommendation from the embedded market table.
pub struct RateRecommendationAgent;

#[async_trait]
impl RateRecommender for RateRecommendationAgent {
    async fn process(&self, request: RateRequest<'_>) -> AgentResult<RateRecommendation> {
        let container = request
            .shipment_details
            .container_type
            .as_deref()
            .unwrap_or("40GP");
        let (origin, destination) = (
            request.port_codes.origin.as_deref(),
            request.port_codes.destination.as_deref(),
        );

        let mut rate_ranges: BTreeMap<String, String> = BTreeMap::new();
        let mut recommendations: Vec<String> = Vec::new();

        if let (Some(origin), Some(destination)) = (origin, destination) {
            let route_entry = MARKET_TABLE.iter().find(|(from, to, kind, _, _)| {
                *from == origin && *to == destination && *kind == container
            });
            if let Some((_, _, kind, low, high)) = route_entry {
                rate_ranges.insert(
                    format!("{}-{}", origin, destination),
                    format!("USD {}-{} ({})", low, high, kind),
                );
                recommendations.push(format!(
                    "Market band for {} -> {} is USD {}-{} per {}",
                    origin, destination, low, high, kind
                ));
            }
        }

        if rate_ranges.is_empty() {
            if let Some((kind, low, high)) = GENERIC_BANDS
                .iter()
                .find(|(kind, _, _)| *kind == container)
            {
                rate_ranges.insert(
                    "generic".to_string(),
                    format!("USD {}-{} ({})", low, high, kind),
                );
                recommendations
                    .push(format!("No route data; generic {} band applied", kind));
            }
        }

        let status = if rate_ranges.is_empty() {
            "no_data"
        } else {
            "ok"
        };
        Ok(RateRecommendation {
            status: status.to_string(),
            rate_ranges,
            recommendations,
            reason: None,
        })
    }
}
