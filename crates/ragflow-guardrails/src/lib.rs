//! Input and output scanner chains: regex/secrets/language/token-limit
//! scanners on the way in, data-leakage/relevance/hallucination/refusal
//! scanners on the way out, aggregated into a [`ragflow_core::GuardrailOutcome`]
//! per the configured block/log/sanitize mode.

pub mod chain;
pub mod error;
pub mod scanner;
pub mod scanners;
pub mod stages;

pub use chain::{Mode, ScannerChain};
pub use error::{GuardrailsError, Result};
pub use scanner::{ScanContext, ScanOutcome, Scanner, ScannerKind};
pub use scanners::*;
pub use stages::{InputGuardrailsStage, OutputGuardrailsStage, RejectionMessages};
