//! Free-form thread analysis

use async_trait::async_trait;
use salesflow_workflow_engine::adapters::{AgentResult, ThreadAnalysisRequest, ThreadAnalyzer};
use salesflow_workflow_engine::thread_store::Direction;
use serde_json::Value;
use std::collections::BTreeSet;

/// Summarizes the thread: counts, participants, last direction.
pub struct ThreadAnalysisAgent;

#[async_trait]
impl ThreadAnalyzer for ThreadAnalysisAgent {
    async fn process(&self, request: ThreadAnalysisRequest<'_>) -> AgentResult<Value> {
        let inbound = request
            .thread_history
            .iter()
            .filter(|e| e.direction == Direction::Inbound)
            .count();
        let outbound = request.thread_history.len() - inbound;
        let participants: BTreeSet<&str> = request
            .thread_history
            .iter()
            .map(|e| e.sender.as_str())
            .chain(std::iter::once(request.sender))
            .collect();

        let mut key_insights: Vec<String> = Vec::new();
        if request.thread_history.is_empty() {
            key_insights.push("first email of the thread".to_string());
        } else {
            key_insights.push(format!(
                "{} prior emails ({} inbound, {} outbound)",
                request.thread_history.len(),
                inbound,
                outbound
            ));
        }
        if participants.len() > 2 {
            key_insights.push("multi-party conversation".to_string());
        }

        Ok(serde_json::json!({
            "key_insights": key_insights,
            "email_count": request.thread_history.len(),
            "inbound_count": inbound,
            "outbound_count": outbound,
            "participants": participants.iter().collect::<Vec<_>>(),
        }))
    }
}
