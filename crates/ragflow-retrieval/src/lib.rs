//! Hybrid retrieval, fusion, rerank, classification/filtering, and the
//! taxonomy registry.

pub mod classification;
pub mod error;
pub mod fusion;
pub mod query_prep;
pub mod stages;
pub mod taxonomy_registry;

pub use classification::{ClassificationResult, SemanticClassifier};
pub use error::{Result, RetrievalError};
pub use fusion::reciprocal_rank_fusion;
pub use query_prep::{Aggregator, LanguageDetector, Translator};
pub use stages::*;
pub use taxonomy_registry::TaxonomyRegistry;
