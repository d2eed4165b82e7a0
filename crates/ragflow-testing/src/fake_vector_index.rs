//! A brute-force in-memory [`VectorIndex`]: cosine similarity over every
//! stored embedding, no approximate search structure.

use async_trait::async_trait;
use parking_lot::RwLock;
use ragflow_core::{CoreError, Document, DocumentMetadata, ScoredDocument, VectorIndex};
use std::collections::HashMap;

struct Point {
    embedding: Vec<f32>,
    payload: serde_json::Value,
}

#[derive(Default)]
pub struct FakeVectorIndex {
    points: RwLock<HashMap<i64, Point>>,
    dimension: RwLock<Option<usize>>,
}

impl FakeVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configured_dimension(&self) -> Option<usize> {
        *self.dimension.read()
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
impl VectorIndex for FakeVectorIndex {
    async fn search(&self, embedding: &[f32], top_k: usize, category: Option<&str>) -> Result<Vec<ScoredDocument>, CoreError> {
        let points = self.points.read();
        let mut scored: Vec<ScoredDocument> = points
            .iter()
            .filter(|(_, point)| match (category, point.payload.get("category").and_then(|v| v.as_str())) {
                (Some(wanted), Some(got)) => wanted == got,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .map(|(id, point)| {
                let score = cosine_similarity(embedding, &point.embedding);
                let metadata = DocumentMetadata {
                    category: point.payload.get("category").and_then(|v| v.as_str()).map(String::from),
                    intent: point.payload.get("intent").and_then(|v| v.as_str()).map(String::from),
                    source_document: point.payload.get("source").and_then(|v| v.as_str()).map(String::from),
                    ..Default::default()
                };
                let document = Document { id: Some(*id), content: String::new(), embedding: point.embedding.clone(), metadata };
                ScoredDocument { document, score, rank: 0 }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        for (rank, hit) in scored.iter_mut().enumerate() {
            hit.rank = rank + 1;
        }
        Ok(scored)
    }

    async fn upsert(&self, id: i64, embedding: Vec<f32>, payload: serde_json::Value) -> Result<(), CoreError> {
        self.points.write().insert(id, Point { embedding, payload });
        Ok(())
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), CoreError> {
        *self.dimension.write() = Some(dimension);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity_descending() {
        let index = FakeVectorIndex::new();
        index.upsert(1, vec![1.0, 0.0], serde_json::json!({})).await.unwrap();
        index.upsert(2, vec![0.0, 1.0], serde_json::json!({})).await.unwrap();

        let hits = index.search(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits[0].document.id, Some(1));
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[1].rank, 2);
    }

    #[tokio::test]
    async fn search_filters_by_category() {
        let index = FakeVectorIndex::new();
        index.upsert(1, vec![1.0, 0.0], serde_json::json!({"category": "Shipping"})).await.unwrap();
        index.upsert(2, vec![1.0, 0.0], serde_json::json!({"category": "Billing"})).await.unwrap();

        let hits = index.search(&[1.0, 0.0], 10, Some("Billing")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, Some(2));
    }

    #[tokio::test]
    async fn ensure_collection_records_dimension() {
        let index = FakeVectorIndex::new();
        assert!(index.configured_dimension().is_none());
        index.ensure_collection(384).await.unwrap();
        assert_eq!(index.configured_dimension(), Some(384));
    }
}
