//! `rerank` stage: cross-encoder rescoring of the fused candidates.

use async_trait::async_trait;
use ragflow_core::{CoreError, PartialRunState, Reranker, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;
use tracing::warn;

/// Replaces fusion scores with cross-encoder scores and reorders `docs`
/// descending by the new score. `confidence` becomes the top score, or 0 if
/// `docs` is empty (spec.md §4.4's guarantee that reranking an empty list
/// preserves `confidence = 0`).
pub struct RerankStage {
    reranker: Arc<dyn Reranker>,
}

impl RerankStage {
    /// Construct a new stage over the given reranker.
    pub fn new(reranker: Arc<dyn Reranker>) -> Self {
        Self { reranker }
    }
}

#[async_trait]
impl Stage for RerankStage {
    fn name(&self) -> &'static str {
        "rerank"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["docs"],
            optional: vec!["translated_query", "question"],
            guaranteed_outputs: vec!["docs", "rerank_scores", "confidence"],
            conditional_outputs: vec!["best_doc_metadata"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let mut partial = PartialRunState::default();

        if state.docs.is_empty() {
            partial.docs = Some(vec![]);
            partial.rerank_scores = Some(vec![]);
            partial.confidence = Some(0.0);
            return Ok(partial);
        }

        let query = state.translated_query.as_deref().unwrap_or(&state.question);
        let scores = match self.reranker.score(query, &state.docs).await {
            Ok(scores) => scores,
            Err(err) => {
                warn!(error = %err, "rerank: reranker unavailable, keeping fusion order with zero confidence");
                partial.docs = Some(state.docs.clone());
                partial.rerank_scores = Some(vec![0.0; state.docs.len()]);
                partial.confidence = Some(0.0);
                return Ok(partial);
            }
        };

        let mut reordered: Vec<_> = state.docs.iter().cloned().zip(scores.iter().copied()).collect();
        reordered.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let docs: Vec<_> = reordered
            .iter()
            .enumerate()
            .map(|(idx, (doc, score))| ragflow_core::ScoredDocument {
                document: doc.document.clone(),
                score: *score,
                rank: idx + 1,
            })
            .collect();
        let rerank_scores: Vec<f32> = reordered.iter().map(|(_, score)| *score).collect();
        let confidence = rerank_scores.first().copied().unwrap_or(0.0);
        let best_doc_metadata = docs.first().map(|doc| doc.document.metadata.clone());

        partial.docs = Some(docs);
        partial.rerank_scores = Some(rerank_scores);
        partial.confidence = Some(confidence);
        partial.best_doc_metadata = Some(best_doc_metadata);
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait as at;
    use ragflow_core::{Document, DocumentMetadata, ScoredDocument};

    struct FixedReranker(Vec<f32>);

    #[at]
    impl Reranker for FixedReranker {
        async fn score(&self, _query: &str, _candidates: &[ScoredDocument]) -> Result<Vec<f32>, CoreError> {
            Ok(self.0.clone())
        }
    }

    fn doc(content: &str) -> ScoredDocument {
        ScoredDocument {
            document: Document::new(content, vec![0.0], DocumentMetadata::default()),
            score: 0.5,
            rank: 1,
        }
    }

    #[tokio::test]
    async fn empty_docs_preserve_zero_confidence() {
        let stage = RerankStage::new(Arc::new(FixedReranker(vec![])));
        let state = RunState::new("hi");
        let partial = stage.execute(&state).await.unwrap();
        assert_eq!(partial.confidence, Some(0.0));
        assert_eq!(partial.docs, Some(vec![]));
    }

    #[tokio::test]
    async fn reorders_docs_by_score_descending() {
        let stage = RerankStage::new(Arc::new(FixedReranker(vec![0.2, 0.9])));
        let mut state = RunState::new("hi");
        state.docs = vec![doc("low"), doc("high")];
        let partial = stage.execute(&state).await.unwrap();
        let docs = partial.docs.unwrap();
        assert_eq!(docs[0].document.content, "high");
        assert_eq!(partial.confidence, Some(0.9));
    }
}
