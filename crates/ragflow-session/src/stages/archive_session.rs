//! `archive_session` stage.
//!
//! Grounded in `original_source/app/nodes/archive_session/node.py`: writes
//! the turn's messages, persists `attempt_count`/`extracted_entities` for
//! the next turn's `session_starter` to restore, and writes an escalation
//! record when the turn ended in an `ESCALATION_*` state.

use async_trait::async_trait;
use ragflow_core::{
    CoreError, DialogState, Escalation, EscalationPriority, EscalationStatus, Message, PartialRunState, Role,
    RowStore, RunState, Session, StageContract,
};
use ragflow_pipeline::Stage;
use std::sync::Arc;

pub struct ArchiveSessionStage {
    store: Arc<dyn RowStore>,
}

impl ArchiveSessionStage {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }
}

fn is_escalation(state: DialogState) -> bool {
    matches!(state, DialogState::EscalationNeeded | DialogState::EscalationRequested)
}

#[async_trait]
impl Stage for ArchiveSessionStage {
    fn name(&self) -> &'static str {
        "archive_session"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["session_id"],
            optional: vec!["user_id", "question", "answer", "dialog_state", "attempt_count", "extracted_entities", "escalation_reason"],
            guaranteed_outputs: vec![],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let Some(session_id) = &state.session_id else {
            return Ok(PartialRunState::default());
        };

        let now = chrono::Utc::now();
        let mut session = match self.store.load_session(session_id).await? {
            Some(session) => session,
            None => Session::new(session_id.clone(), state.user_id.clone(), now),
        };

        let mut turn = vec![Message {
            id: None,
            role: Role::User,
            content: state.question.clone(),
            timestamp: Some(now),
            metadata: Default::default(),
        }];
        if let Some(answer) = &state.answer {
            turn.push(Message {
                id: None,
                role: Role::Assistant,
                content: answer.clone(),
                timestamp: Some(now),
                metadata: Default::default(),
            });
        }
        session.append(turn, now);
        session.attempt_count = state.attempt_count;
        session.extracted_entities = state.extracted_entities.clone();
        self.store.save_session(&session).await?;

        if is_escalation(state.dialog_state) {
            let escalation = Escalation {
                session_id: session_id.clone(),
                reason: state.escalation_reason.clone(),
                priority: if state.dialog_state == DialogState::EscalationRequested {
                    EscalationPriority::High
                } else {
                    EscalationPriority::Normal
                },
                status: EscalationStatus::Open,
            };
            self.store.save_escalation(&escalation).await?;
        }

        Ok(PartialRunState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        sessions: Mutex<HashMap<String, Session>>,
        escalations: Mutex<Vec<Escalation>>,
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
        async fn save_escalation(&self, escalation: &Escalation) -> Result<(), CoreError> {
            self.escalations.lock().unwrap().push(escalation.clone());
            Ok(())
        }
        async fn load_user_profile(&self, _user_id: &str) -> Result<Option<ragflow_core::UserProfile>, CoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn writes_turn_messages_and_persists_attempt_count() {
        let store = Arc::new(FakeStore::default());
        let stage = ArchiveSessionStage::new(store.clone());
        let mut state = RunState::new("where is my order");
        state.session_id = Some("s1".to_string());
        state.answer = Some("It ships tomorrow.".to_string());
        state.attempt_count = 1;

        stage.execute(&state).await.unwrap();

        let saved = store.load_session("s1").await.unwrap().unwrap();
        assert_eq!(saved.messages.len(), 2);
        assert_eq!(saved.attempt_count, 1);
    }

    #[tokio::test]
    async fn writes_escalation_record_on_escalation_states() {
        let store = Arc::new(FakeStore::default());
        let stage = ArchiveSessionStage::new(store.clone());
        let mut state = RunState::new("get me a human");
        state.session_id = Some("s1".to_string());
        state.dialog_state = DialogState::EscalationRequested;
        state.escalation_reason = Some("user_requested".to_string());

        stage.execute(&state).await.unwrap();

        assert_eq!(store.escalations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_escalation_record_for_non_escalation_states() {
        let store = Arc::new(FakeStore::default());
        let stage = ArchiveSessionStage::new(store.clone());
        let mut state = RunState::new("thanks");
        state.session_id = Some("s1".to_string());
        state.dialog_state = DialogState::Resolved;

        stage.execute(&state).await.unwrap();

        assert!(store.escalations.lock().unwrap().is_empty());
    }
}
