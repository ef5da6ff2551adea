//! Inbound email normalization and identifier schemes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw inbound email as received from a frontend.
///
/// Alternative field names used by different frontends (`body_text`/`body`
/// for the content, `from_email`/`from` for the sender) are accepted as
/// serde aliases and coalesced during [`RawEmail::normalize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEmail {
    /// Sender address
    #[serde(default, alias = "from_email", alias = "from")]
    pub sender: String,
    /// Optional display name of the sender
    #[serde(default, alias = "from_name")]
    pub sender_name: Option<String>,
    /// Subject line
    #[serde(default)]
    pub subject: String,
    /// Body text
    #[serde(default, alias = "body_text", alias = "body")]
    pub content: String,
    /// Thread identifier, if the frontend already threaded the email
    #[serde(default)]
    pub thread_id: Option<String>,
}

impl RawEmail {
    /// Normalize into the canonical inbound shape.
    ///
    /// A missing thread id is replaced by a timestamped synthetic id and a
    /// first name is derived for the greeting of outbound responses.
    pub fn normalize(self, now: DateTime<Utc>) -> InboundEmail {
        let thread_id = self
            .thread_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| synthesize_thread_id(now));
        let first_name = extract_first_name(&self.sender, self.sender_name.as_deref());
        InboundEmail {
            sender: self.sender,
            sender_name: self.sender_name,
            first_name,
            subject: self.subject,
            content: self.content,
            thread_id,
        }
    }
}

/// Normalized inbound email, the immutable input of one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmail {
    /// Sender address
    pub sender: String,
    /// Display name, when the frontend supplied one
    pub sender_name: Option<String>,
    /// First name used to address the customer in responses
    pub first_name: String,
    /// Subject line
    pub subject: String,
    /// Body text
    pub content: String,
    /// Thread the email belongs to
    pub thread_id: String,
}

impl InboundEmail {
    /// True when the email carries no usable body.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Greeting fallback when no name can be derived from the sender.
pub const VALUED_CUSTOMER: &str = "Valued Customer";

/// Derive a first name from a display name or the local part of an address.
///
/// `"John Doe"` and `"john.doe@techcorp.com"` both yield `"John"`. When no
/// reasonable token can be extracted the literal `"Valued Customer"` is
/// returned.
pub fn extract_first_name(email: &str, full_name: Option<&str>) -> String {
    if let Some(name) = full_name {
        if let Some(first) = name.split_whitespace().next() {
            return capitalize(first);
        }
    }

    let local = match email.split('@').next() {
        Some(local) if !local.is_empty() => local,
        _ => return VALUED_CUSTOMER.to_string(),
    };

    if let Some(first) = local.split('.').next() {
        if first.len() > 1 {
            return capitalize(first);
        }
    }

    if local.len() > 1 {
        return capitalize(local);
    }

    VALUED_CUSTOMER.to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Timestamp layout shared by workflow and thread ids, microsecond precision.
const ID_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Build a workflow id from a monotonic timestamp.
pub fn synthesize_workflow_id(now: DateTime<Utc>) -> String {
    format!("workflow_{}", now.format(ID_TIMESTAMP_FORMAT))
}

/// Build a thread id for an email that arrived without one.
pub fn synthesize_thread_id(now: DateTime<Utc>) -> String {
    format!("thread_{}", now.format(ID_TIMESTAMP_FORMAT))
}

/// Email id of the outbound entry produced by a turn.
pub fn outbound_email_id(workflow_id: &str) -> String {
    format!("bot_{}", workflow_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn first_name_from_dotted_local_part() {
        assert_eq!(extract_first_name("john.doe@techcorp.com", None), "John");
        assert_eq!(extract_first_name("jane.smith@example.com", None), "Jane");
    }

    #[test]
    fn first_name_prefers_display_name() {
        assert_eq!(
            extract_first_name("jd@example.com", Some("John Doe")),
            "John"
        );
        assert_eq!(extract_first_name("x@example.com", Some("JANE")), "Jane");
    }

    #[test]
    fn first_name_from_plain_local_part() {
        assert_eq!(extract_first_name("jane@example.com", None), "Jane");
    }

    #[test]
    fn first_name_falls_back_for_unusable_addresses() {
        assert_eq!(extract_first_name("", None), VALUED_CUSTOMER);
        assert_eq!(extract_first_name("x@example.com", None), VALUED_CUSTOMER);
    }

    #[test]
    fn ids_carry_prefix_and_microseconds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 5).unwrap()
            + chrono::Duration::microseconds(123456);
        assert_eq!(
            synthesize_workflow_id(now),
            "workflow_20240315_103005_123456"
        );
        assert_eq!(synthesize_thread_id(now), "thread_20240315_103005_123456");
        assert_eq!(outbound_email_id("workflow_1"), "bot_workflow_1");
    }

    #[test]
    fn normalize_fills_thread_id_and_first_name() {
        let raw = RawEmail {
            sender: "john.doe@techcorp.com".to_string(),
            sender_name: None,
            subject: "Quote".to_string(),
            content: "body".to_string(),
            thread_id: None,
        };
        let email = raw.normalize(Utc::now());
        assert!(email.thread_id.starts_with("thread_"));
        assert_eq!(email.first_name, "John");
    }

    #[test]
    fn raw_email_accepts_alternative_field_names() {
        let email: RawEmail = serde_json::from_str(
            r#"{"from_email": "a@b.com", "subject": "s", "body_text": "hello"}"#,
        )
        .unwrap();
        assert_eq!(email.sender, "a@b.com");
        assert_eq!(email.content, "hello");
    }
}
