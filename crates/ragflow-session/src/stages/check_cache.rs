//! `check_cache` stage (spec.md §4.9): exact-match by fingerprint, then
//! semantic-match via the question embedding when present.

use crate::fingerprint::{fingerprint, FingerprintScope};
use async_trait::async_trait;
use ragflow_core::{CacheConfig, CacheReason, CacheStore, CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

pub struct CheckCacheStage {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl CheckCacheStage {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }
}

fn scope<'a>(state: &'a RunState) -> FingerprintScope<'a> {
    FingerprintScope {
        user_or_channel: state.user_id.as_deref().or(state.session_id.as_deref()),
        language: state.detected_language.as_deref(),
        category: state.category.as_deref(),
    }
}

#[async_trait]
impl Stage for CheckCacheStage {
    fn name(&self) -> &'static str {
        "check_cache"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["question"],
            optional: vec!["user_id", "session_id", "detected_language", "category", "question_embedding"],
            guaranteed_outputs: vec!["cache_hit"],
            conditional_outputs: vec!["answer", "best_doc_metadata", "confidence", "cache_key", "cache_reason"],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let key = fingerprint(&state.question, &scope(state));
        let mut partial = PartialRunState::default();

        if let Some(cached) = self.store.get(&key).await? {
            partial.cache_hit = Some(true);
            partial.cache_key = Some(Some(key));
            partial.cache_reason = Some(Some(CacheReason::ExactMatch));
            partial.answer = Some(Some(cached.answer));
            partial.confidence = Some(cached.confidence);
            partial.best_doc_metadata = Some(cached.best_doc_metadata);
            return Ok(partial);
        }

        if let Some(embedding) = &state.question_embedding {
            if let Some((stored_key, cached)) = self.store.find_similar(embedding, self.config.similarity_threshold).await? {
                partial.cache_hit = Some(true);
                partial.cache_key = Some(Some(stored_key));
                partial.cache_reason = Some(Some(CacheReason::SemanticMatch));
                partial.answer = Some(Some(cached.answer));
                partial.confidence = Some(cached.confidence);
                partial.best_doc_metadata = Some(cached.best_doc_metadata);
                return Ok(partial);
            }
        }

        partial.cache_hit = Some(false);
        partial.cache_key = Some(Some(key));
        Ok(partial)
    }
}
