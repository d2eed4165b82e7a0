//! Typed configuration shapes.
//!
//! Parsing a TOML/YAML document into one of these types is this crate's job;
//! finding that document on disk and wiring it into a running process is
//! out of scope (contract-only), per spec.md §1's exclusion of "config file
//! loading."

use serde::{Deserialize, Serialize};

fn default_rrf_k() -> u32 {
    60
}

fn default_embed_batch_size() -> u32 {
    32
}

fn default_max_attempts_before_escalation() -> u32 {
    3
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_cache_similarity_threshold() -> f32 {
    0.92
}

fn default_draft_ttl_days() -> i64 {
    7
}

fn default_cache_ttl_seconds() -> i64 {
    3600
}

fn default_max_history_messages() -> u32 {
    20
}

fn default_vector_dimension() -> usize {
    384
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Retrieval tuning knobs.
    pub retrieval: RetrievalConfig,
    /// Dialog state machine tuning knobs.
    pub dialog: DialogConfig,
    /// Result cache tuning knobs.
    pub cache: CacheConfig,
    /// Staging/ingestion tuning knobs.
    pub ingestion: IngestionConfig,
    /// Session loading/archiving tuning knobs.
    pub session: SessionConfig,
    /// Names of stages to enable, in registration order. An empty list means
    /// "use the canonical ordering" (see the orchestrator crate).
    pub enabled_stages: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            dialog: DialogConfig::default(),
            cache: CacheConfig::default(),
            ingestion: IngestionConfig::default(),
            session: SessionConfig::default(),
            enabled_stages: Vec::new(),
        }
    }
}

/// Session loading/archiving tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of recent messages `session_starter` loads into
    /// `conversation_history`.
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: u32,
    /// Whether to eagerly load the user profile during `session_starter`.
    pub load_user_profile: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_history_messages: default_max_history_messages(), load_user_profile: true }
    }
}

/// Retrieval/fusion/rerank tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Reciprocal-rank-fusion constant `k`.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,
    /// Number of candidates retained per leg before fusion.
    pub top_k_per_leg: u32,
    /// Number of fused candidates sent to the reranker.
    pub rerank_candidates: u32,
    /// Confidence threshold below which `LowConfidence` routing applies.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            top_k_per_leg: 20,
            rerank_candidates: 10,
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Dialog state machine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Unresolved attempts allowed before forcing escalation.
    #[serde(default = "default_max_attempts_before_escalation")]
    pub max_attempts_before_escalation: u32,
    /// Whether empathy-mode override is enabled at all.
    pub empathy_mode_enabled: bool,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            max_attempts_before_escalation: default_max_attempts_before_escalation(),
            empathy_mode_enabled: true,
        }
    }
}

/// Result cache tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cosine similarity threshold for a semantic cache hit.
    #[serde(default = "default_cache_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Entry time-to-live.
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_cache_similarity_threshold(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

/// Staging→commit ingestion tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Batch size for embedding calls during commit.
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: u32,
    /// Days an unreviewed draft survives before TTL purge.
    #[serde(default = "default_draft_ttl_days")]
    pub draft_ttl_days: i64,
    /// Dimension of the embedding vectors committed documents are indexed
    /// with; used to create the vector collection if it does not exist.
    #[serde(default = "default_vector_dimension")]
    pub vector_dimension: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            embed_batch_size: default_embed_batch_size(),
            draft_ttl_days: default_draft_ttl_days(),
            vector_dimension: default_vector_dimension(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_missing_fields_from_empty_document() {
        let cfg: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.retrieval.rrf_k, 60);
        assert_eq!(cfg.ingestion.embed_batch_size, 32);
        assert_eq!(cfg.dialog.max_attempts_before_escalation, 3);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let toml_doc = r#"
            [retrieval]
            rrf_k = 100
        "#;
        let cfg: PipelineConfig = toml::from_str(toml_doc).unwrap();
        assert_eq!(cfg.retrieval.rrf_k, 100);
        assert_eq!(cfg.retrieval.confidence_threshold, 0.5);
    }
}
