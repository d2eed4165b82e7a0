//! `session_starter` stage.
//!
//! Grounded in `original_source/app/nodes/session_starter/node.py`: loads
//! recent history from the row store, creates the session row if it's
//! missing, and restores only the persistent fields (`attempt_count`,
//! `extracted_entities`) — `dialog_state` is deliberately never restored so
//! a terminal state from a previous turn (e.g. `SAFETY_VIOLATION`) can't
//! leak into a new one.

use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RowStore, RunState, Session, SessionConfig, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

pub struct SessionStarterStage {
    store: Arc<dyn RowStore>,
    config: SessionConfig,
}

impl SessionStarterStage {
    pub fn new(store: Arc<dyn RowStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl Stage for SessionStarterStage {
    fn name(&self) -> &'static str {
        "session_starter"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["user_id", "session_id"],
            optional: vec![],
            guaranteed_outputs: vec!["conversation_history"],
            conditional_outputs: vec!["attempt_count", "extracted_entities"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let mut partial = PartialRunState::default();

        let Some(session_id) = &state.session_id else {
            partial.conversation_history = Some(Vec::new());
            return Ok(partial);
        };

        match self.store.load_session(session_id).await? {
            Some(session) => {
                let limit = self.config.max_history_messages as usize;
                partial.conversation_history = Some(session.recent_messages(limit));
                partial.attempt_count = Some(session.attempt_count);
                if !session.extracted_entities.is_empty() {
                    partial.extracted_entities = Some(session.extracted_entities);
                }
            }
            None => {
                let now = chrono::Utc::now();
                let mut session = Session::new(session_id.clone(), state.user_id.clone(), now);
                session.channel = None;
                self.store.save_session(&session).await?;
                partial.conversation_history = Some(Vec::new());
            }
        }

        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragflow_core::{Escalation, Role};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        sessions: Mutex<HashMap<String, Session>>,
    }

    #[async_trait]
    impl RowStore for FakeStore {
        async fn find_document_by_content(&self, _content: &str) -> Result<Option<ragflow_core::Document>, CoreError> {
            Ok(None)
        }
        async fn insert_document(&self, _document: ragflow_core::Document) -> Result<i64, CoreError> {
            Ok(1)
        }
        async fn distinct_categories_and_intents(&self) -> Result<Vec<(String, String)>, CoreError> {
            Ok(Vec::new())
        }
        async fn load_session(&self, session_id: &str) -> Result<Option<Session>, CoreError> {
            Ok(self.sessions.lock().unwrap().get(session_id).cloned())
        }
        async fn save_session(&self, session: &Session) -> Result<(), CoreError> {
            self.sessions.lock().unwrap().insert(session.id.clone(), session.clone());
            Ok(())
        }
        async fn save_escalation(&self, _escalation: &Escalation) -> Result<(), CoreError> {
            Ok(())
        }
        async fn load_user_profile(&self, _user_id: &str) -> Result<Option<ragflow_core::UserProfile>, CoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn restores_attempt_count_but_not_dialog_state() {
        let store = Arc::new(FakeStore::default());
        let now = chrono::Utc::now();
        let mut session = Session::new("s1", Some("u1".to_string()), now);
        session.attempt_count = 2;
        session.extracted_entities.insert("order_id".to_string(), vec!["123".to_string()]);
        session.append(vec![ragflow_core::Message { id: None, role: Role::User, content: "hi".into(), timestamp: None, metadata: Default::default() }], now);
        store.save_session(&session).await.unwrap();

        let stage = SessionStarterStage::new(store, SessionConfig::default());
        let mut state = RunState::new("where is my order");
        state.user_id = Some("u1".to_string());
        state.session_id = Some("s1".to_string());

        let partial = stage.execute(&state).await.unwrap();
        assert_eq!(partial.attempt_count, Some(2));
        assert_eq!(partial.extracted_entities.unwrap().get("order_id").unwrap(), &vec!["123".to_string()]);
        assert_eq!(partial.conversation_history.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn creates_a_new_session_row_when_missing() {
        let store = Arc::new(FakeStore::default());
        let stage = SessionStarterStage::new(store.clone(), SessionConfig::default());
        let mut state = RunState::new("hi");
        state.user_id = Some("u1".to_string());
        state.session_id = Some("brand-new".to_string());

        let partial = stage.execute(&state).await.unwrap();
        assert_eq!(partial.conversation_history.unwrap().len(), 0);
        assert!(store.load_session("brand-new").await.unwrap().is_some());
    }
}
