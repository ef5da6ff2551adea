//! Container type standardization

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{
    AgentResult, ContainerRequest, ContainerStandardization, ContainerStandardizer,
};

/// Maps colloquial container spellings to standard types.
///
/// The rate fallback type feeds pricing when a market table has no entry
/// for the exact type; it is never shown to customers.
pub struct ContainerStandardizationAgent;

fn standardize(raw: &str) -> Option<&'static str> {
    let compact: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match compact.as_str() {
        "40HC" | "40HQ" | "40HIGHCUBE" | "40FTHIGHCUBE" | "40FTHC" => Some("40HC"),
        "40" | "40GP" | "40FT" | "40STANDARD" | "40FTSTANDARD" | "40DV" => Some("40GP"),
        "20" | "20GP" | "20FT" | "20STANDARD" | "20FTSTANDARD" | "20DV" => Some("20GP"),
        "45" | "45HC" | "45FT" | "45HIGHCUBE" => Some("45HC"),
        "40RF" | "40REEFER" | "REEFER" | "40FTREEFER" => Some("40RF"),
        _ => None,
    }
}

fn rate_fallback(standardized: &str) -> &'static str {
    match standardized {
        "40HC" => "40GP",
        "45HC" => "40HC",
        "40RF" => "40HC",
        other => match other {
            "20GP" => "20GP",
            _ => "40GP",
        },
    }
}

#[async_trait]
impl ContainerStandardizer for ContainerStandardizationAgent {
    async fn process(
        &self,
        request: ContainerRequest<'_>,
    ) -> AgentResult<ContainerStandardization> {
        match standardize(request.container_type) {
            Some(standardized) => Ok(ContainerStandardization {
                standardized_type: Some(standardized.to_string()),
                rate_fallback_type: Some(rate_fallback(standardized).to_string()),
                reason: None,
            }),
            None => Ok(ContainerStandardization {
                standardized_type: Some(request.container_type.trim().to_uppercase()),
                rate_fallback_type: Some("40GP".to_string()),
                reason: Some(format!(
                    "unrecognized container type '{}', kept as stated",
                    request.container_type.trim()
                )),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn colloquial_spellings_standardize() {
        for (raw, expected) in [
            ("40hc", "40HC"),
            ("40 HC", "40HC"),
            ("40hq", "40HC"),
            ("40ft", "40GP"),
            ("20 ft", "20GP"),
            ("45 hc", "45HC"),
        ] {
            let result = ContainerStandardizationAgent
                .process(ContainerRequest {
                    container_type: raw,
                    container_count: None,
                })
                .await
                .unwrap();
            assert_eq!(result.standardized_type.as_deref(), Some(expected), "{raw}");
        }
    }

    #[tokio::test]
    async fn fallback_type_is_distinct_from_display_type() {
        let result = ContainerStandardizationAgent
            .process(ContainerRequest {
                container_type: "40HC",
                container_count: Some("2"),
            })
            .await
            .unwrap();
        assert_eq!(result.standardized_type.as_deref(), Some("40HC"));
        assert_eq!(result.rate_fallback_type.as_deref(), Some("40GP"));
    }
}
