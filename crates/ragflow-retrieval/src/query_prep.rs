//! Traits for the query-preparation stages that run between dialog analysis
//! and classification: aggregation, language detection, and translation.

use async_trait::async_trait;
use ragflow_core::{CoreError, Message};

/// Combines the latest turn with relevant history context into one search
/// query. Two implementations are interchangeable — a lightweight
/// heuristic (recent-turn concatenation) and an LLM-driven rewrite — chosen
/// by configuration, mirroring
/// `original_source/app/nodes/aggregation/{lightweight,llm}.py`.
#[async_trait]
pub trait Aggregator: Send + Sync {
    /// Produce the aggregated query for `question` given `history`.
    async fn aggregate(&self, question: &str, history: &[Message]) -> Result<String, CoreError>;
}

/// Detects the language of the user's question.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Returns an ISO 639-1 code and a confidence in `[0, 1]`.
    async fn detect(&self, text: &str) -> Result<(String, f32), CoreError>;
}

/// Translates a query into the knowledge base's primary language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_language` into `target_language`.
    /// Returns `None` if no translation was necessary (languages already
    /// match).
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, CoreError>;
}
