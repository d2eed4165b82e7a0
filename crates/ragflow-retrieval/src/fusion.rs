//! Reciprocal-rank fusion of ranked candidate lists.
//!
//! Grounded in spec.md §4.4's fusion rule: `score = Σ 1/(k + rank_in_list_i)`
//! across every list a document appears in, ties broken by vector score then
//! by document id for determinism. `original_source/app/pipeline/
//! node_registry.py` confirms a `fusion` node exists in the original
//! topology, but its implementation was not captured in this pack.

use ragflow_core::ScoredDocument;
use std::collections::HashMap;

/// A document's identity for fusion purposes: its row-store id if
/// persisted, else its content (unpersisted documents can't collide on id).
fn doc_key(doc: &ragflow_core::Document) -> String {
    match doc.id {
        Some(id) => format!("id:{id}"),
        None => format!("content:{}", doc.content),
    }
}

/// Merge one or more ranked lists into a single list ordered by fused RRF
/// score descending, ties broken by the best vector score seen for that
/// document, then by its identity key for full determinism.
///
/// Returns an empty list if every input list is empty, leaving `confidence`
/// at the caller's responsibility to zero (spec.md §4.4's guarantee).
pub fn reciprocal_rank_fusion(lists: &[Vec<ScoredDocument>], k: u32) -> Vec<ScoredDocument> {
    struct Accumulated {
        document: ragflow_core::Document,
        fused_score: f32,
        best_raw_score: f32,
    }

    let mut accumulator: HashMap<String, Accumulated> = HashMap::new();

    for list in lists {
        for hit in list {
            let key = doc_key(&hit.document);
            let contribution = 1.0 / (k as f32 + hit.rank as f32);
            accumulator
                .entry(key)
                .and_modify(|acc| {
                    acc.fused_score += contribution;
                    if hit.score > acc.best_raw_score {
                        acc.best_raw_score = hit.score;
                    }
                })
                .or_insert(Accumulated {
                    document: hit.document.clone(),
                    fused_score: contribution,
                    best_raw_score: hit.score,
                });
        }
    }

    let mut fused: Vec<(String, Accumulated)> = accumulator.into_iter().collect();
    fused.sort_by(|(key_a, a), (key_b, b)| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.best_raw_score.partial_cmp(&a.best_raw_score).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| key_a.cmp(key_b))
    });

    fused
        .into_iter()
        .enumerate()
        .map(|(idx, (_, acc))| ScoredDocument {
            document: acc.document,
            score: acc.fused_score,
            rank: idx + 1,
        })
        .collect()
}
