//! `fusion` stage: reciprocal-rank merge of the vector and lexical legs.

use crate::fusion::reciprocal_rank_fusion;
use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;

/// Merges `vector_results` and `lexical_results` into `docs`, truncated to
/// `top_k`. Sets `hybrid_used` once both legs contributed at least one hit.
pub struct FusionStage {
    k: u32,
    top_k: usize,
}

impl FusionStage {
    /// Construct a new stage with the given RRF constant and output size.
    pub fn new(k: u32, top_k: usize) -> Self {
        Self { k, top_k }
    }
}

#[async_trait]
impl Stage for FusionStage {
    fn name(&self) -> &'static str {
        "fusion"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["vector_results", "lexical_results"],
            optional: vec![],
            guaranteed_outputs: vec!["docs", "hybrid_used"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let fused = reciprocal_rank_fusion(&[state.vector_results.clone(), state.lexical_results.clone()], self.k);
        let truncated: Vec<_> = fused.into_iter().take(self.top_k).collect();

        let mut partial = PartialRunState::default();
        partial.hybrid_used = Some(!state.vector_results.is_empty() && !state.lexical_results.is_empty());
        partial.docs = Some(truncated);
        Ok(partial)
    }
}
