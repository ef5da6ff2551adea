//! Sales-team roster and per-thread assignment

use crate::error::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// A sales person whose identity is used in outbound signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesPerson {
    pub id: String,
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    pub signature: String,
}

impl SalesPerson {
    /// Placeholder specialist used when the roster is empty or loading
    /// failed. Keeps acknowledgments and clarifications sendable.
    pub fn default_specialist() -> Self {
        SalesPerson {
            id: "SP000".to_string(),
            name: "Digital Sales Specialist".to_string(),
            title: "Digital Sales Specialist".to_string(),
            email: "sales@salesflow.example".to_string(),
            phone: "+1-555-0123".to_string(),
            whatsapp: None,
            specialization: None,
            signature: "Best regards,\n\nDigital Sales Specialist\nSalesflow Logistics\nsales@salesflow.example\n+1-555-0123".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    sales_team: Vec<SalesPerson>,
}

/// The roster of sales people.
///
/// Assignment rotates through the roster keyed by a stable hash of the
/// thread id, so every turn of one thread sees the same signature and
/// replays are deterministic.
#[derive(Debug, Default)]
pub struct SalesTeam {
    roster: Vec<SalesPerson>,
}

impl SalesTeam {
    pub fn new(roster: Vec<SalesPerson>) -> Self {
        Self { roster }
    }

    /// Load a roster from a JSON file with a top-level `sales_team` list.
    pub fn load(path: impl AsRef<Path>) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WorkflowError::Registry(format!("sales team file: {}", e)))?;
        let file: RosterFile = serde_json::from_str(&content)
            .map_err(|e| WorkflowError::Registry(format!("sales team file: {}", e)))?;
        Ok(Self::new(file.sales_team))
    }

    /// Built-in roster used when no roster file is configured.
    pub fn default_roster() -> Self {
        let member = |id: &str, name: &str, title: &str, email: &str, phone: &str, focus: &str| {
            SalesPerson {
                id: id.to_string(),
                name: name.to_string(),
                title: title.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                whatsapp: Some(phone.to_string()),
                specialization: Some(focus.to_string()),
                signature: format!(
                    "Best regards,\n\n{}\n{}\nSalesflow Logistics\n{}\n{}",
                    name, title, email, phone
                ),
            }
        };
        Self::new(vec![
            member(
                "SP001",
                "Sarah Johnson",
                "Senior Sales Manager",
                "sarah.johnson@salesflow.example",
                "+1-555-0101",
                "Asia-Pacific Routes",
            ),
            member(
                "SP002",
                "Michael Chen",
                "Account Executive",
                "michael.chen@salesflow.example",
                "+1-555-0202",
                "Europe-Middle East Routes",
            ),
            member(
                "SP003",
                "Emily Rodriguez",
                "Business Development Manager",
                "emily.rodriguez@salesflow.example",
                "+1-555-0303",
                "Americas Routes",
            ),
            member(
                "SP004",
                "David Kim",
                "Client Relations Manager",
                "david.kim@salesflow.example",
                "+1-555-0404",
                "Africa Routes",
            ),
        ])
    }

    /// Assign the sales person responsible for a thread.
    pub fn assign_for_thread(&self, thread_id: &str) -> SalesPerson {
        if self.roster.is_empty() {
            tracing::warn!("sales roster is empty, using default specialist");
            return SalesPerson::default_specialist();
        }
        let mut hasher = DefaultHasher::new();
        thread_id.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.roster.len();
        self.roster[index].clone()
    }

    /// True when the address belongs to a roster member.
    pub fn is_sales_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.roster
            .iter()
            .any(|p| p.email.trim().to_lowercase() == email)
    }

    pub fn roster(&self) -> &[SalesPerson] {
        &self.roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_stable_per_thread() {
        let team = SalesTeam::default_roster();
        let a = team.assign_for_thread("thread_1");
        let b = team.assign_for_thread("thread_1");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_roster_falls_back_to_default_specialist() {
        let team = SalesTeam::new(Vec::new());
        let assigned = team.assign_for_thread("thread_1");
        assert_eq!(assigned.name, "Digital Sales Specialist");
    }

    #[test]
    fn roster_membership_check() {
        let team = SalesTeam::default_roster();
        assert!(team.is_sales_email("sarah.johnson@salesflow.example"));
        assert!(!team.is_sales_email("customer@example.com"));
    }
}
