//! `routing` stage.

use crate::routing::{self, BlacklistPolicy};
use async_trait::async_trait;
use ragflow_core::{ActionRecommendation, CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;

pub struct RoutingStage {
    policy: BlacklistPolicy,
}

impl RoutingStage {
    pub fn new(policy: BlacklistPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Stage for RoutingStage {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec!["action_recommendation", "matched_category", "matched_intent"],
            guaranteed_outputs: vec!["action"],
            conditional_outputs: vec!["escalation_triggered"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let recommendation = state.action_recommendation.unwrap_or(ActionRecommendation::AutoReply);
        let decision = routing::decide(state, recommendation, &self.policy);

        let mut partial = PartialRunState::default();
        partial.action = Some(Some(decision.action));
        partial.escalation_triggered = Some(decision.escalation_triggered);
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragflow_core::Action;

    #[tokio::test]
    async fn defaults_to_auto_reply_when_no_recommendation_set() {
        let stage = RoutingStage::new(BlacklistPolicy::default());
        let state = RunState::new("hi");
        let partial = stage.execute(&state).await.unwrap();
        assert_eq!(partial.action, Some(Some(Action::AutoReply)));
    }
}
