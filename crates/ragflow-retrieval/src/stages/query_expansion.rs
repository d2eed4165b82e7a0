//! `query_expansion` stage (optional): paraphrase the query and fan out
//! sub-searches, unioned before fusion with a per-query weight decay.

use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, QueryExpander, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;
use tracing::warn;

/// Generates up to `max_expansions` paraphrases of the (possibly
/// translated) query. A failure here degrades to zero expansions rather
/// than failing the request — fusion still has the original query's
/// vector/lexical legs to work with.
pub struct QueryExpansionStage {
    expander: Arc<dyn QueryExpander>,
    max_expansions: usize,
}

impl QueryExpansionStage {
    /// Construct a new stage over the given expander.
    pub fn new(expander: Arc<dyn QueryExpander>, max_expansions: usize) -> Self {
        Self { expander, max_expansions }
    }
}

#[async_trait]
impl Stage for QueryExpansionStage {
    fn name(&self) -> &'static str {
        "query_expansion"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec![],
            optional: vec!["translated_query", "question"],
            guaranteed_outputs: vec!["queries"],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let query = state.translated_query.as_deref().unwrap_or(&state.question).to_string();
        let expansions = match self.expander.expand(&query, self.max_expansions).await {
            Ok(expansions) => expansions,
            Err(err) => {
                warn!(error = %err, "query_expansion: expander unavailable, continuing without expansions");
                vec![]
            }
        };

        let mut queries = vec![query];
        queries.extend(expansions);

        let mut partial = PartialRunState::default();
        partial.queries = Some(queries);
        Ok(partial)
    }
}
