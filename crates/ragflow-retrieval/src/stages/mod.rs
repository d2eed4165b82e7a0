//! Stage implementations for the retrieval, classification, and filtering
//! portion of the pipeline.

pub mod aggregation;
pub mod classification_stage;
pub mod fusion_stage;
pub mod language_detection;
pub mod lexical_search;
pub mod metadata_filtering;
pub mod query_expansion;
pub mod query_translation;
pub mod rerank_stage;
pub mod vector_search;

pub use aggregation::AggregationStage;
pub use classification_stage::{ClassificationStage, FallbackPolicy};
pub use fusion_stage::FusionStage;
pub use language_detection::LanguageDetectionStage;
pub use lexical_search::LexicalSearchStage;
pub use metadata_filtering::MetadataFilteringStage;
pub use query_expansion::QueryExpansionStage;
pub use query_translation::QueryTranslationStage;
pub use rerank_stage::RerankStage;
pub use vector_search::VectorSearchStage;
