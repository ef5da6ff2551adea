//! Per-thread conversation persistence
//!
//! One JSON file per thread, named by thread id. Entries are stored in
//! insertion order and reads never reorder. Failures degrade to `None`
//! or `false`; the orchestrator keeps the turn alive regardless.

use crate::error::WorkflowResult;
use crate::extraction::Extraction;
use crate::merge::merge_with_recency_priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Direction of an email within a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Customer, forwarder or sales-person email
    Inbound,
    /// Bot response
    Outbound,
}

/// One email within a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEntry {
    pub timestamp: DateTime<Utc>,
    pub email_id: String,
    pub sender: String,
    pub direction: Direction,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub extracted_data: Option<Extraction>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub bot_response: Option<Value>,
    #[serde(default)]
    pub workflow_id: Option<String>,
}

/// Complete state of one email thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadData {
    pub thread_id: String,
    pub email_chain: Vec<EmailEntry>,
    #[serde(default)]
    pub cumulative_extraction: Extraction,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub customer_context: Value,
    #[serde(default)]
    pub forwarder_context: Value,
    #[serde(default = "ThreadData::default_conversation_state")]
    pub conversation_state: String,
    #[serde(default)]
    pub total_emails: usize,
}

impl ThreadData {
    fn default_conversation_state() -> String {
        "new_thread".to_string()
    }

    /// Fresh thread containing a single email.
    pub fn new(thread_id: String, initial_email: EmailEntry) -> Self {
        ThreadData {
            thread_id,
            email_chain: vec![initial_email],
            cumulative_extraction: Extraction::default(),
            last_updated: Utc::now(),
            customer_context: Value::Object(Default::default()),
            forwarder_context: Value::Object(Default::default()),
            conversation_state: Self::default_conversation_state(),
            total_emails: 1,
        }
    }

    /// Minimal placeholder used by the turn committer when persistence
    /// failed; keeps the turn alive without a durable thread.
    pub fn placeholder(thread_id: String) -> Self {
        ThreadData {
            thread_id,
            email_chain: Vec::new(),
            cumulative_extraction: Extraction::default(),
            last_updated: Utc::now(),
            customer_context: Value::Object(Default::default()),
            forwarder_context: Value::Object(Default::default()),
            conversation_state: Self::default_conversation_state(),
            total_emails: 1,
        }
    }
}

/// File-backed thread store.
#[derive(Debug)]
pub struct ThreadStore {
    storage_dir: PathBuf,
}

impl ThreadStore {
    /// Open a store rooted at `storage_dir`, creating it if necessary.
    pub fn new(storage_dir: impl Into<PathBuf>) -> WorkflowResult<Self> {
        let storage_dir = storage_dir.into();
        std::fs::create_dir_all(&storage_dir)?;
        tracing::info!(dir = %storage_dir.display(), "thread store opened");
        Ok(Self { storage_dir })
    }

    fn thread_path(&self, thread_id: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", thread_id))
    }

    /// Load a thread; `None` when it does not exist or cannot be read.
    pub fn load(&self, thread_id: &str) -> Option<ThreadData> {
        let path = self.thread_path(thread_id);
        if !path.exists() {
            return None;
        }
        match read_thread(&path) {
            Ok(thread) => Some(thread),
            Err(error) => {
                tracing::error!(thread_id, %error, "failed to load thread");
                None
            }
        }
    }

    /// Persist a thread; `false` on failure.
    pub fn save(&self, thread: &ThreadData) -> bool {
        let path = self.thread_path(&thread.thread_id);
        match serde_json::to_vec_pretty(thread)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(&path, bytes))
        {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(thread_id = %thread.thread_id, %error, "failed to save thread");
                false
            }
        }
    }

    /// Append an email to a thread, creating the thread when absent.
    ///
    /// When the entry carries extracted data it is folded into the
    /// cumulative extraction, and the conversation-state tag is advanced
    /// from the entry's direction and response type. Returns the updated
    /// thread, or `None` when persistence failed.
    pub fn append(&self, thread_id: &str, entry: EmailEntry) -> Option<ThreadData> {
        let mut thread = match self.load(thread_id) {
            Some(thread) => thread,
            None => {
                tracing::info!(thread_id, "creating new thread");
                let mut thread = ThreadData::new(thread_id.to_string(), entry);
                advance_conversation_state(&mut thread);
                if let Some(extracted) = thread.email_chain[0].extracted_data.clone() {
                    thread.cumulative_extraction =
                        merge_with_recency_priority(&extracted, &thread.cumulative_extraction);
                }
                return self.save(&thread).then_some(thread);
            }
        };

        thread.email_chain.push(entry);
        thread.total_emails = thread.email_chain.len();
        thread.last_updated = Utc::now();

        if let Some(extracted) = thread
            .email_chain
            .last()
            .and_then(|e| e.extracted_data.clone())
        {
            thread.cumulative_extraction =
                merge_with_recency_priority(&extracted, &thread.cumulative_extraction);
        }
        advance_conversation_state(&mut thread);

        self.save(&thread).then_some(thread)
    }

    /// Cumulative extraction of a thread; empty when the thread is absent.
    pub fn cumulative(&self, thread_id: &str) -> Extraction {
        self.load(thread_id)
            .map(|thread| thread.cumulative_extraction)
            .unwrap_or_default()
    }

    /// Merge a new extraction into a thread's cumulative record and
    /// persist it. `false` when the thread is absent or saving failed.
    pub fn update_cumulative(&self, thread_id: &str, new_extraction: &Extraction) -> bool {
        let mut thread = match self.load(thread_id) {
            Some(thread) => thread,
            None => {
                tracing::warn!(thread_id, "thread not found for cumulative update");
                return false;
            }
        };
        thread.cumulative_extraction =
            merge_with_recency_priority(new_extraction, &thread.cumulative_extraction);
        thread.last_updated = Utc::now();
        self.save(&thread)
    }

    /// Thread ids currently persisted, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = std::fs::read_dir(&self.storage_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter_map(|entry| {
                        let name = entry.file_name().to_string_lossy().to_string();
                        name.strip_suffix(".json").map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

fn read_thread(path: &Path) -> Result<ThreadData, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(std::io::Error::other)
}

/// Advance the coarse conversation-state tag from the newest entry.
fn advance_conversation_state(thread: &mut ThreadData) {
    let Some(entry) = thread.email_chain.last() else {
        return;
    };
    match entry.direction {
        Direction::Inbound => {
            if thread.conversation_state == "new_thread" {
                thread.conversation_state = "customer_initial_request".to_string();
            } else if let Some(response_type) = &entry.response_type {
                thread.conversation_state = format!("customer_{}", response_type);
            }
        }
        Direction::Outbound => {
            if let Some(response_type) = &entry.response_type {
                thread.conversation_state = format!("bot_{}", response_type);
            }
        }
    }
}
