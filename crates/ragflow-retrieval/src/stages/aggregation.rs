//! `aggregation` stage: combine the latest turn with history into one
//! search query.

use crate::query_prep::Aggregator;
use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

/// Delegates to the configured [`Aggregator`] implementation — lightweight
/// or LLM-driven are interchangeable behind the trait.
pub struct AggregationStage {
    aggregator: Arc<dyn Aggregator>,
}

impl AggregationStage {
    /// Construct a new stage over the given aggregator.
    pub fn new(aggregator: Arc<dyn Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl Stage for AggregationStage {
    fn name(&self) -> &'static str {
        "aggregation"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["question"],
            optional: vec!["conversation_history"],
            guaranteed_outputs: vec!["aggregated_query"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let aggregated = self
            .aggregator
            .aggregate(&state.question, &state.conversation_history)
            .await?;
        let mut partial = PartialRunState::default();
        partial.aggregated_query = Some(Some(aggregated));
        Ok(partial)
    }
}
