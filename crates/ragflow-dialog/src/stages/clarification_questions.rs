//! `clarification_questions` stage: reached instead of `generation` when the
//! best candidate document demands disambiguation before an answer can be
//! given, or the dialog is already mid-clarification.
//!
//! Grounded in `original_source/app/pipeline/routing_logic_clarification.py`'s
//! `route_after_retrieval` (dialog_state primary check, clarifying_questions
//! metadata fallback) and spec.md §4.3's clarification branch.

use async_trait::async_trait;
use ragflow_core::{Action, CoreError, DialogState, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;

pub struct ClarificationQuestionsStage;

impl ClarificationQuestionsStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClarificationQuestionsStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for ClarificationQuestionsStage {
    fn name(&self) -> &'static str {
        "clarification_questions"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec!["best_doc_metadata"],
            guaranteed_outputs: vec!["answer", "dialog_state", "action"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let questions = state
            .best_doc_metadata
            .as_ref()
            .map(|m| m.clarifying_questions.clone())
            .unwrap_or_default();

        let answer = if questions.is_empty() {
            "Could you clarify your question?".to_string()
        } else {
            questions.join(" ")
        };

        let mut partial = PartialRunState::default();
        partial.answer = Some(Some(answer));
        partial.dialog_state = Some(DialogState::AwaitingClarification);
        partial.action = Some(Some(Action::AutoReply));
        Ok(partial)
    }
}
