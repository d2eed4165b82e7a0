//! Pipeline stage wrappers around the input/output scanner chains.

pub mod input_guardrails;
pub mod output_guardrails;

pub use input_guardrails::{InputGuardrailsStage, RejectionMessages};
pub use output_guardrails::OutputGuardrailsStage;
