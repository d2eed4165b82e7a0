//! Semantic classification: embeds the query once and picks the top
//! category/intent against the current taxonomy by cosine similarity.
//!
//! Grounded in `original_source/app/services/classification/semantic_service.py`;
//! `app/nodes/classification/node.py` imports a `ClassificationService` from
//! `app.nodes.classification.classifier`, but that module's contents were not
//! captured in this pack. Two call sites (`easy_classification`,
//! `classification`) share one service, differing only in configured
//! thresholds and fallback labels.

use async_trait::async_trait;
use ragflow_core::CoreError;

/// One classification decision: the top category and top intent, each with
/// its own confidence.
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    /// Top-matched category name.
    pub category: Option<String>,
    /// Confidence of the category match, `[0, 1]`.
    pub category_confidence: f32,
    /// Top-matched intent name.
    pub intent: Option<String>,
    /// Confidence of the intent match, `[0, 1]`.
    pub intent_confidence: f32,
}

/// Embeds a query and scores it against the taxonomy's label embeddings.
/// Implementations subscribe to taxonomy reloads (`ragflow_core::ports`
/// doesn't model pub/sub directly; callers re-invoke `refresh` after every
/// successful `TaxonomyRegistry::reload`) to keep label embeddings current.
#[async_trait]
pub trait SemanticClassifier: Send + Sync {
    /// Classify `query`, returning `None` if no taxonomy labels are loaded.
    async fn classify(&self, query: &str) -> Result<Option<ClassificationResult>, CoreError>;

    /// Re-embed the current taxonomy's category/intent descriptions.
    async fn refresh(&self, taxonomy: &ragflow_core::TaxonomySnapshot) -> Result<(), CoreError>;
}
