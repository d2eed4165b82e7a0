//! `dialog_analysis` stage.

use crate::analysis::DialogAnalyzer;
use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

/// Delegates to the configured [`DialogAnalyzer`] — regex or LLM-backed are
/// interchangeable behind the trait.
pub struct DialogAnalysisStage {
    analyzer: Arc<dyn DialogAnalyzer>,
}

impl DialogAnalysisStage {
    pub fn new(analyzer: Arc<dyn DialogAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl Stage for DialogAnalysisStage {
    fn name(&self) -> &'static str {
        "dialog_analysis"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["question"],
            optional: vec!["conversation_history"],
            guaranteed_outputs: vec!["dialog_analysis", "sentiment"],
            conditional_outputs: vec!["safety_violation", "escalation_requested"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let (analysis, sentiment) = self
            .analyzer
            .analyze(&state.question, &state.conversation_history)
            .await?;

        let mut partial = PartialRunState::default();
        partial.escalation_requested = Some(analysis.escalation_requested);
        partial.sentiment = Some(Some(sentiment));
        partial.dialog_analysis = Some(Some(analysis));
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RegexDialogAnalyzer;

    #[tokio::test]
    async fn surfaces_escalation_requested_to_top_level_field() {
        let stage = DialogAnalysisStage::new(Arc::new(RegexDialogAnalyzer::new()));
        let state = RunState::new("let me talk to a human");
        let partial = stage.execute(&state).await.unwrap();
        assert_eq!(partial.escalation_requested, Some(true));
        assert!(partial.dialog_analysis.unwrap().is_some());
    }
}
