use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::slots::OutputSlot;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A single message in a conversation. Immutable once appended; append
/// order is the only ordering guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub text: String,
    pub timestamp: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            agent: None,
            text: text.into(),
            timestamp: now_stamp(),
        }
    }

    pub fn agent(agent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            agent: Some(agent.into()),
            text: text.into(),
            timestamp: now_stamp(),
        }
    }
}

// RFC 3339, matching SessionInfo's created/updated stamps.
fn now_stamp() -> String {
    Local::now().to_rfc3339()
}

/// Per-session state: ordered transcript plus the latest value of each
/// workflow output slot.
#[derive(Debug)]
struct Conversation {
    turns: Vec<Turn>,
    slots: HashMap<OutputSlot, String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Conversation {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            turns: Vec::new(),
            slots: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Read-only copy of a conversation for rendering. Owned data, so a
/// concurrent writer cannot corrupt a renderer's view mid-iteration.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub turns: Vec<Turn>,
    pub slots: HashMap<OutputSlot, String>,
}

/// Summary info for a session (for listing in the UI sidebar).
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// In-memory store of all conversations, keyed by session id.
///
/// Each conversation sits behind its own mutex, so operations for one
/// session id are serialized while different sessions never contend.
/// Nothing is persisted; the store lives and dies with the process.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<Conversation>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    fn conversation(&self, session_id: &str) -> Arc<Mutex<Conversation>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new())))
            .clone()
    }

    /// Get or create the conversation for `session_id` and return a
    /// read-only copy. Never fails.
    pub fn open(&self, session_id: &str) -> Snapshot {
        self.snapshot(session_id)
    }

    /// Append a turn to the transcript. O(1) amortized; turns are never
    /// reordered or dropped.
    pub fn append_turn(&self, session_id: &str, turn: Turn) {
        let conv = self.conversation(session_id);
        let mut conv = conv.lock().expect("session lock poisoned");
        conv.turns.push(turn);
        conv.updated_at = Utc::now();
    }

    /// Overwrite a slot value. Last write wins; no history of intermediate
    /// values beyond the transcript itself.
    pub fn write_slot(&self, session_id: &str, slot: OutputSlot, value: impl Into<String>) {
        let conv = self.conversation(session_id);
        let mut conv = conv.lock().expect("session lock poisoned");
        conv.slots.insert(slot, value.into());
        conv.updated_at = Utc::now();
    }

    /// Overwrite a slot addressed by its string key, as declared in agent
    /// configuration. A key outside the fixed set is rejected and leaves
    /// prior state unchanged.
    pub fn write_slot_key(&self, session_id: &str, key: &str, value: impl Into<String>) -> Result<()> {
        let slot: OutputSlot = key.parse()?;
        self.write_slot(session_id, slot, value);
        Ok(())
    }

    pub fn read_slot(&self, session_id: &str, slot: OutputSlot) -> Option<String> {
        let conv = self.conversation(session_id);
        let conv = conv.lock().expect("session lock poisoned");
        conv.slots.get(&slot).cloned()
    }

    /// Read-only copy of transcript and slots.
    pub fn snapshot(&self, session_id: &str) -> Snapshot {
        let conv = self.conversation(session_id);
        let conv = conv.lock().expect("session lock poisoned");
        Snapshot {
            turns: conv.turns.clone(),
            slots: conv.slots.clone(),
        }
    }

    /// Drop one conversation entirely.
    pub fn reset(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Drop all conversations (process-level reset).
    pub fn clear(&self) {
        self.sessions.clear();
    }

    /// List known sessions, most recently updated first. Titles come from
    /// the first user turn.
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|entry| {
                let conv = entry.value().lock().expect("session lock poisoned");
                let title = conv
                    .turns
                    .iter()
                    .find(|t| t.role == Role::User)
                    .map(|t| truncate_title(&t.text))
                    .unwrap_or_else(|| "New Chat".to_string());
                SessionInfo {
                    id: entry.key().clone(),
                    title,
                    created_at: conv.created_at.to_rfc3339(),
                    updated_at: conv.updated_at.to_rfc3339(),
                }
            })
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_title(text: &str) -> String {
    let mut title: String = text.chars().take(50).collect();
    if text.chars().count() > 50 {
        title.push_str("...");
    }
    title
}
