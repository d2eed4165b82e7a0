//! `output_guardrails` stage.

use crate::chain::ScannerChain;
use crate::scanner::ScanContext;
use async_trait::async_trait;
use ragflow_core::{Action, CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;

use crate::stages::input_guardrails::RejectionMessages;

/// Scans the generated answer before it's returned to the user. Sanitized
/// text replaces the answer in place; a block substitutes the localized
/// rejection message, same as the input side.
pub struct OutputGuardrailsStage {
    chain: ScannerChain,
    rejection_messages: RejectionMessages,
}

impl OutputGuardrailsStage {
    pub fn new(chain: ScannerChain, rejection_messages: RejectionMessages) -> Self {
        Self { chain, rejection_messages }
    }
}

#[async_trait]
impl Stage for OutputGuardrailsStage {
    fn name(&self) -> &'static str {
        "output_guardrails"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["answer"],
            optional: vec!["question", "detected_language"],
            guaranteed_outputs: vec!["output_guardrails"],
            conditional_outputs: vec!["answer", "action"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let answer = state.answer.clone().unwrap_or_default();
        let ctx = ScanContext {
            detected_language: state.detected_language.clone(),
            user_query: Some(state.question.clone()),
        };
        let (outcome, sanitized) = self.chain.scan(&answer, &ctx).await?;

        let mut partial = PartialRunState::default();
        let blocked = outcome.blocked;
        partial.output_guardrails = Some(outcome);

        if blocked {
            let message = self.rejection_messages.for_language(state.detected_language.as_deref());
            partial.answer = Some(Some(message));
            partial.action = Some(Some(Action::AutoReply));
        } else if let Some(sanitized) = sanitized {
            partial.answer = Some(Some(sanitized));
        }

        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Mode;
    use crate::scanners::{LeakagePattern, DataLeakageScanner};
    use regex::Regex;

    #[tokio::test]
    async fn sanitizes_leaked_data_in_the_answer() {
        let patterns =
            vec![LeakagePattern { description: "phone number".to_string(), regex: Regex::new(r"\d{3}-\d{3}-\d{4}").unwrap() }];
        let stage = OutputGuardrailsStage::new(
            ScannerChain::new(vec![Box::new(DataLeakageScanner::new(patterns))], Mode::Sanitize),
            RejectionMessages::default(),
        );
        let mut state = RunState::new("what is support's number?");
        state.answer = Some("call 555-123-4567 for help".to_string());
        let partial = stage.execute(&state).await.unwrap();
        assert!(partial.answer.unwrap().unwrap().contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn clean_answer_passes_through_unmodified() {
        let stage = OutputGuardrailsStage::new(ScannerChain::new(vec![], Mode::Block), RejectionMessages::default());
        let mut state = RunState::new("where is my order?");
        state.answer = Some("Your order ships in two business days.".to_string());
        let partial = stage.execute(&state).await.unwrap();
        assert!(partial.output_guardrails.unwrap().passed);
        assert!(partial.answer.is_none());
    }
}
