//! `input_guardrails` stage.

use crate::chain::ScannerChain;
use crate::scanner::ScanContext;
use async_trait::async_trait;
use ragflow_core::{Action, CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::collections::HashMap;

/// Localized safe-rejection messages, keyed by language code, with a
/// `"default"` fallback — mirrors `InputGuardrailsNode`'s
/// `rejection_messages` config.
pub struct RejectionMessages {
    messages: HashMap<String, String>,
}

impl RejectionMessages {
    pub fn new(messages: HashMap<String, String>) -> Self {
        Self { messages }
    }

    pub(crate) fn for_language(&self, language: Option<&str>) -> String {
        language
            .and_then(|lang| self.messages.get(lang))
            .or_else(|| self.messages.get("default"))
            .cloned()
            .unwrap_or_else(|| "I cannot process this request.".to_string())
    }
}

impl Default for RejectionMessages {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

/// Scans the incoming question before retrieval runs. On block, sets
/// `answer` to a localized rejection message and `action = auto_reply` so
/// the pipeline can skip straight to generation; the state machine reads
/// `guardrails_blocked()` independently to route to `BLOCKED`.
pub struct InputGuardrailsStage {
    chain: ScannerChain,
    rejection_messages: RejectionMessages,
}

impl InputGuardrailsStage {
    pub fn new(chain: ScannerChain, rejection_messages: RejectionMessages) -> Self {
        Self { chain, rejection_messages }
    }
}

#[async_trait]
impl Stage for InputGuardrailsStage {
    fn name(&self) -> &'static str {
        "input_guardrails"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["question"],
            optional: vec!["detected_language"],
            guaranteed_outputs: vec!["input_guardrails"],
            conditional_outputs: vec!["answer", "action"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let ctx = ScanContext { detected_language: state.detected_language.clone(), user_query: None };
        let (outcome, _sanitized) = self.chain.scan(&state.question, &ctx).await?;

        let mut partial = PartialRunState::default();
        let blocked = outcome.blocked;
        partial.input_guardrails = Some(outcome);

        if blocked {
            let message = self.rejection_messages.for_language(state.detected_language.as_deref());
            partial.answer = Some(Some(message));
            partial.action = Some(Some(Action::AutoReply));
        }

        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Mode;
    use crate::scanner::{ScanOutcome, Scanner, ScannerKind};
    use ragflow_core::CoreError as Err;

    struct AlwaysSecrets;

    #[async_trait::async_trait]
    impl Scanner for AlwaysSecrets {
        fn kind(&self) -> ScannerKind {
            ScannerKind::Secrets
        }
        async fn scan(&self, _text: &str, _ctx: &ScanContext) -> Result<ScanOutcome, Err> {
            Ok(ScanOutcome { kind: ScannerKind::Secrets, triggered: true, risk_score: 1.0, sanitized_text: None })
        }
    }

    #[tokio::test]
    async fn blocked_turn_sets_localized_rejection_answer() {
        let mut messages = HashMap::new();
        messages.insert("default".to_string(), "No puedo procesar esto.".to_string());
        let stage = InputGuardrailsStage::new(
            ScannerChain::new(vec![Box::new(AlwaysSecrets)], Mode::Block),
            RejectionMessages::new(messages),
        );
        let state = RunState::new("sk-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let partial = stage.execute(&state).await.unwrap();
        assert!(partial.input_guardrails.unwrap().blocked);
        assert_eq!(partial.answer.unwrap().unwrap(), "No puedo procesar esto.");
        assert_eq!(partial.action.unwrap().unwrap(), Action::AutoReply);
    }

    #[tokio::test]
    async fn clean_turn_passes_without_answer() {
        let stage = InputGuardrailsStage::new(ScannerChain::new(vec![], Mode::Block), RejectionMessages::default());
        let state = RunState::new("where is my order?");
        let partial = stage.execute(&state).await.unwrap();
        assert!(partial.input_guardrails.unwrap().passed);
        assert!(partial.answer.is_none());
    }
}
