//! Reducer semantics for `RunState` fields.
//!
//! Each `RunState` field declares one of four merge strategies when a stage's
//! partial update is applied. These mirror the reducer functions in the
//! original pipeline's `state.py` (`overwrite`, `keep_latest`, `merge_unique`)
//! plus LangGraph's message-append reducer, generalized here to a de-dup-by-id
//! append since `RunState` is not framework-managed.

use crate::run_state::Message;

/// Replace the existing value with the new one. The default reducer.
pub fn overwrite<T>(_existing: T, new: T) -> T {
    new
}

/// Replace only if the new value is present; otherwise keep the existing one.
///
/// Used for fields like `docs` where an absent partial update must not erase
/// a value produced by an earlier stage.
pub fn keep_latest<T>(existing: Option<T>, new: Option<T>) -> Option<T> {
    new.or(existing)
}

/// Append new messages to the existing conversation, de-duplicating by
/// `(role, content)` identity when no explicit id is present, and by id when
/// one is present. Preserves original order; new messages are appended after
/// existing ones with earlier-seen duplicates dropped.
pub fn append_messages(existing: Vec<Message>, new: Vec<Message>) -> Vec<Message> {
    let mut seen: std::collections::HashSet<String> = existing.iter().map(message_key).collect();
    let mut merged = existing;
    for msg in new {
        let key = message_key(&msg);
        if seen.insert(key) {
            merged.push(msg);
        }
    }
    merged
}

fn message_key(msg: &Message) -> String {
    match &msg.id {
        Some(id) => id.clone(),
        None => format!("{:?}:{}", msg.role, msg.content),
    }
}

/// Set-union of string-like collections, preserving first-seen order.
///
/// Mirrors `merge_unique` in the original `state.py`: existing items come
/// first, followed by any genuinely new items from the update.
pub fn merge_unique(existing: Vec<String>, new: Vec<String>) -> Vec<String> {
    let mut seen: std::collections::HashSet<String> = existing.iter().cloned().collect();
    let mut merged = existing;
    for item in new {
        if seen.insert(item.clone()) {
            merged.push(item);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_state::Role;

    fn msg(role: Role, content: &str) -> Message {
        Message {
            id: None,
            role,
            content: content.to_string(),
            timestamp: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn append_messages_dedupes_by_content_when_no_id() {
        let existing = vec![msg(Role::User, "hi")];
        let new = vec![msg(Role::User, "hi"), msg(Role::Assistant, "hello")];
        let merged = append_messages(existing, new);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].content, "hello");
    }

    #[test]
    fn append_messages_dedupes_by_id_when_present() {
        let mut a = msg(Role::User, "hi");
        a.id = Some("m1".into());
        let mut b = msg(Role::User, "hi but edited");
        b.id = Some("m1".into());
        let merged = append_messages(vec![a], vec![b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content, "hi");
    }

    #[test]
    fn merge_unique_preserves_order_and_dedupes() {
        let existing = vec!["a".to_string(), "b".to_string()];
        let new = vec!["b".to_string(), "c".to_string()];
        assert_eq!(merge_unique(existing, new), vec!["a", "b", "c"]);
    }

    #[test]
    fn keep_latest_falls_back_to_existing_when_new_absent() {
        assert_eq!(keep_latest(Some(1), None), Some(1));
        assert_eq!(keep_latest(Some(1), Some(2)), Some(2));
        assert_eq!(keep_latest(None::<i32>, None), None);
    }
}
