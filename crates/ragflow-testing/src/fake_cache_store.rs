//! An in-memory [`CacheStore`] with TTL tracked via stored expiry instants,
//! and brute-force semantic lookup over whatever embeddings were cached
//! alongside their answers.

use async_trait::async_trait;
use parking_lot::RwLock;
use ragflow_core::{CacheStore, CachedAnswer, CoreError};
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: CachedAnswer,
    expires_at: Instant,
}

#[derive(Default)]
pub struct FakeCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl FakeCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl CacheStore for FakeCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CachedAnswer>, CoreError> {
        let mut entries = self.entries.write();
        let expired = entries.get(key).is_some_and(|entry| Instant::now() >= entry.expires_at);
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: CachedAnswer, ttl_seconds: i64) -> Result<(), CoreError> {
        let ttl = Duration::from_secs(ttl_seconds.max(0) as u64);
        self.entries.write().insert(key.to_string(), Entry { value, expires_at: Instant::now() + ttl });
        Ok(())
    }

    async fn find_similar(&self, embedding: &[f32], threshold: f32) -> Result<Option<(String, CachedAnswer)>, CoreError> {
        let entries = self.entries.read();
        let now = Instant::now();
        let best = entries
            .iter()
            .filter(|(_, entry)| now < entry.expires_at)
            .filter_map(|(key, entry)| {
                let candidate_embedding = entry.value.embedding.as_ref()?;
                let score = cosine_similarity(embedding, candidate_embedding);
                (score >= threshold).then_some((score, key.clone(), entry.value.clone()))
            })
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best.map(|(_, key, value)| (key, value)))
    }
}
