//! `prompt_routing` stage: runs after `routing`, before `generation`, and
//! only when the turn is actually headed to generation.

use crate::prompt_routing::{self, SystemInstructions};
use async_trait::async_trait;
use ragflow_core::{Action, CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::collections::HashMap;
use std::sync::Arc;

pub struct PromptRoutingStage {
    instructions: Arc<dyn SystemInstructions>,
}

impl PromptRoutingStage {
    pub fn new(instructions: Arc<dyn SystemInstructions>) -> Self {
        Self { instructions }
    }
}

#[async_trait]
impl Stage for PromptRoutingStage {
    fn name(&self) -> &'static str {
        "prompt_routing"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["dialog_state"],
            optional: vec!["conversation_history", "extracted_entities", "action"],
            guaranteed_outputs: vec![],
            conditional_outputs: vec!["system_prompt"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let mut partial = PartialRunState::default();

        // Only `auto_reply` turns reach generation (spec §4.3's routing
        // edge); skip prompt construction otherwise so `system_prompt`
        // stays unset for clarify/escalate/block turns.
        if state.action != Some(Action::AutoReply) {
            return Ok(partial);
        }

        let system_prompt = prompt_routing::build_system_prompt(
            self.instructions.as_ref(),
            state.dialog_state,
            &state.conversation_history,
            &state.extracted_entities,
            &HashMap::new(),
        );
        partial.system_prompt = Some(Some(system_prompt));
        Ok(partial)
    }
}
