//! Session persistence types.
//!
//! Grounded in `original_source/app/nodes/session_starter/node.py`: a
//! session is a durable record of a conversation, separate from the
//! in-flight `RunState` that exists only for the lifetime of one request.

use crate::run_state::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Closed,
}

/// A durable conversation record, loaded at the start of a request and
/// appended to at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier, stable across turns.
    pub id: String,
    /// Owning user, if known.
    pub user_id: Option<String>,
    /// Delivery channel the session arrived on (e.g. "web", "telegram").
    pub channel: Option<String>,
    /// Full message history for this session, oldest first.
    pub messages: Vec<Message>,
    /// Persistent field restored across turns: how many unresolved attempts
    /// have accumulated (unlike `dialog_state`, which is deliberately
    /// transient and never restored — spec.md §4.8).
    pub attempt_count: u32,
    /// Persistent field restored across turns.
    pub extracted_entities: HashMap<String, Vec<String>>,
    pub status: SessionStatus,
    /// When the session was first created.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When the session was last updated.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// Construct a brand new, empty session.
    pub fn new(id: impl Into<String>, user_id: Option<String>, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id: id.into(),
            user_id,
            channel: None,
            messages: Vec::new(),
            attempt_count: 0,
            extracted_entities: HashMap::new(),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append messages and bump `updated_at`, using the same de-dup-by-id
    /// semantics as the in-request reducer.
    pub fn append(&mut self, new_messages: Vec<Message>, now: chrono::DateTime<chrono::Utc>) {
        self.messages = crate::reducers::append_messages(std::mem::take(&mut self.messages), new_messages);
        self.updated_at = now;
    }

    /// The most recent `limit` messages, oldest-first — what `session_starter`
    /// loads into `conversation_history`.
    pub fn recent_messages(&self, limit: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(limit);
        self.messages[start..].to_vec()
    }
}

/// A durable, cross-session record of a known user (the `user_profiles`
/// table). `session_starter` loads this optionally — spec.md §4.8 treats it
/// as an enrichment of prompt construction, not a required input; a
/// deployment with no identity resolution simply never calls
/// [`crate::RowStore::load_user_profile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: Option<String>,
    /// Free-form accumulated facts about the user (preferences, past
    /// issues, anything prompt construction might surface).
    pub long_term_memory: serde_json::Value,
    pub last_seen: chrono::DateTime<chrono::Utc>,
}

/// A durable record of an escalation outcome for a session, written by
/// `archive_session` whenever the turn ended in an `ESCALATION_*` state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub session_id: String,
    pub reason: Option<String>,
    pub priority: EscalationPriority,
    pub status: EscalationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationPriority {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    Open,
    Resolved,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_state::Role;

    fn ts() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    #[test]
    fn append_bumps_updated_at_and_dedupes() {
        let mut session = Session::new("s1", None, ts());
        let first_update = ts() + chrono::Duration::seconds(5);
        session.append(
            vec![Message {
                id: Some("m1".into()),
                role: Role::User,
                content: "hi".into(),
                timestamp: None,
                metadata: Default::default(),
            }],
            first_update,
        );
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.updated_at, first_update);

        session.append(
            vec![Message {
                id: Some("m1".into()),
                role: Role::User,
                content: "hi".into(),
                timestamp: None,
                metadata: Default::default(),
            }],
            first_update + chrono::Duration::seconds(5),
        );
        assert_eq!(session.messages.len(), 1, "duplicate id must not be appended again");
    }
}
