//! `lexical_search` stage: full-text search over the row store.

use async_trait::async_trait;
use ragflow_core::{CoreError, LexicalIndex, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;
use tracing::warn;

/// Full-text search using the request's detected language, defaulting to
/// English when none was detected. Degrades to an empty leg if the
/// underlying index is unavailable (spec.md §4.4).
pub struct LexicalSearchStage {
    index: Arc<dyn LexicalIndex>,
    top_k: usize,
}

impl LexicalSearchStage {
    /// Construct a new stage over the given lexical index.
    pub fn new(index: Arc<dyn LexicalIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }
}

#[async_trait]
impl Stage for LexicalSearchStage {
    fn name(&self) -> &'static str {
        "lexical_search"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec!["translated_query", "question", "detected_language"],
            guaranteed_outputs: vec!["lexical_results"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let query = state.translated_query.as_deref().unwrap_or(&state.question);
        let language = state.detected_language.as_deref().unwrap_or("en");

        let results = match self.index.search(query, self.top_k, language).await {
            Ok(results) => results,
            Err(err) => {
                warn!(error = %err, "lexical_search: store unavailable, degrading to empty leg");
                vec![]
            }
        };

        let mut partial = PartialRunState::default();
        partial.lexical_results = Some(results);
        Ok(partial)
    }
}
