//! `vector_search` stage: dense kNN search over the translated query.

use async_trait::async_trait;
use ragflow_core::{CoreError, Embedder, PartialRunState, RunState, StageContract, VectorIndex};
use ragflow_pipeline::Stage;
use std::sync::Arc;
use tracing::warn;

/// Encodes the query and searches the vector store, optionally filtered by
/// `category` when `filter_used` was set by `metadata_filtering`.
///
/// Per spec.md §4.4's guarantee: if the vector store is unavailable, this
/// stage returns an empty result list rather than failing the request.
pub struct VectorSearchStage {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl VectorSearchStage {
    /// Construct a new stage over the given embedder and vector index.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self { embedder, index, top_k }
    }
}

#[async_trait]
impl Stage for VectorSearchStage {
    fn name(&self) -> &'static str {
        "vector_search"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec!["translated_query", "question", "category", "filter_used"],
            guaranteed_outputs: vec!["vector_results"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let query = state.translated_query.as_deref().unwrap_or(&state.question);
        let category = if state.filter_used {
            state.category.as_deref()
        } else {
            None
        };

        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(error = %err, "vector_search: embedding failed, degrading to empty leg");
                let mut partial = PartialRunState::default();
                partial.vector_results = Some(vec![]);
                return Ok(partial);
            }
        };

        let results = match self.index.search(&embedding, self.top_k, category).await {
            Ok(results) => results,
            Err(err) => {
                warn!(error = %err, "vector_search: store unavailable, degrading to empty leg");
                vec![]
            }
        };

        let mut partial = PartialRunState::default();
        partial.question_embedding = Some(Some(embedding));
        partial.vector_results = Some(results);
        Ok(partial)
    }
}
