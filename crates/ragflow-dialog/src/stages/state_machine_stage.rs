//! `state_machine` stage: the canonical order's single state-machine
//! evaluation, positioned right after `rerank` so its confidence-gated
//! checks (spec §4.6 step 4) see retrieval's output. Also reachable early,
//! skipping retrieval entirely, via the `guardrails_blocked` jump from
//! `input_guardrails` and the fast-escalate jump from `dialog_analysis`.

use crate::state_machine::StateMachine;
use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

pub struct StateMachineStage {
    machine: Arc<StateMachine>,
}

impl StateMachineStage {
    pub fn new(machine: Arc<StateMachine>) -> Self {
        Self { machine }
    }
}

#[async_trait]
impl Stage for StateMachineStage {
    fn name(&self) -> &'static str {
        "state_machine"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec![
                "dialog_analysis",
                "dialog_state",
                "attempt_count",
                "safety_violation",
                "escalation_decision",
                "sentiment",
                "confidence",
                "best_doc_metadata",
                "vector_results",
            ],
            guaranteed_outputs: vec!["dialog_state", "attempt_count", "action_recommendation"],
            conditional_outputs: vec!["escalation_reason", "transition_source"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let outcome = self.machine.evaluate(state);

        let mut partial = PartialRunState::default();
        partial.dialog_state = Some(outcome.dialog_state);
        partial.attempt_count = Some(outcome.attempt_count);
        partial.action_recommendation = Some(Some(outcome.action_recommendation));
        partial.escalation_reason = Some(outcome.escalation_reason.map(|r| r.as_str().to_string()));
        partial.transition_source = Some(Some(outcome.transition_source));
        Ok(partial)
    }
}
