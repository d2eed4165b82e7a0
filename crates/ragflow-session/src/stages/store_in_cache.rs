//! `store_in_cache` stage: write-back after a cache miss followed by
//! successful generation, or a TTL refresh after a hit.

use async_trait::async_trait;
use ragflow_core::{CacheConfig, CachedAnswer, CacheStore, CoreError, PartialRunState, RunState, StageContract};
use ragflow_pipeline::Stage;
use std::sync::Arc;

pub struct StoreInCacheStage {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl StoreInCacheStage {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl Stage for StoreInCacheStage {
    fn name(&self) -> &'static str {
        "store_in_cache"
    }

    fn contract(&self) -> StageContract {
        StageContract {
            required: vec!["cache_key"],
            optional: vec!["answer", "confidence", "best_doc_metadata", "question_embedding"],
            guaranteed_outputs: vec![],
            conditional_outputs: vec![],
        }
    }

    async fn execute(&self, state: &RunState) -> Result<PartialRunState, CoreError> {
        let Some(key) = &state.cache_key else {
            return Ok(PartialRunState::default());
        };
        let Some(answer) = &state.answer else {
            return Ok(PartialRunState::default());
        };

        let entry = CachedAnswer {
            answer: answer.clone(),
            confidence: state.confidence,
            best_doc_metadata: state.best_doc_metadata.clone(),
            embedding: state.question_embedding.clone(),
        };
        self.store.set(key, entry, self.config.ttl_seconds).await?;
        Ok(PartialRunState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCache {
        entries: Mutex<HashMap<String, CachedAnswer>>,
    }

    #[async_trait]
    impl CacheStore for FakeCache {
        async fn get(&self, key: &str) -> Result<Option<CachedAnswer>, CoreError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: CachedAnswer, _ttl_seconds: i64) -> Result<(), CoreError> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn find_similar(&self, _embedding: &[f32], _threshold: f32) -> Result<Option<(String, CachedAnswer)>, CoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn writes_back_answer_after_generation() {
        let cache = Arc::new(FakeCache::default());
        let stage = StoreInCacheStage::new(cache.clone(), CacheConfig::default());
        let mut state = RunState::new("where is my order?");
        state.cache_key = Some("fp1".to_string());
        state.answer = Some("Tomorrow.".to_string());
        state.confidence = 0.8;

        stage.execute(&state).await.unwrap();
        let stored = cache.get("fp1").await.unwrap().unwrap();
        assert_eq!(stored.answer, "Tomorrow.");
    }

    #[tokio::test]
    async fn no_write_without_an_answer() {
        let cache = Arc::new(FakeCache::default());
        let stage = StoreInCacheStage::new(cache.clone(), CacheConfig::default());
        let mut state = RunState::new("hi");
        state.cache_key = Some("fp1".to_string());

        stage.execute(&state).await.unwrap();
        assert!(cache.get("fp1").await.unwrap().is_none());
    }
}
