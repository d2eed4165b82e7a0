//! Stage contracts: declared input requirements and output guarantees.
//!
//! A stage is, conceptually, `(RunState) -> PartialRunState` plus a declared
//! contract. The contract lets the orchestrator (`ragflow-pipeline`) validate
//! that the DAG order actually produces every required field before a stage
//! that needs it runs, and lets it raise a typed error instead of letting a
//! stage observe a missing field as silent `None`.
//!
//! Grounded in spec.md §4.1's `INPUT_CONTRACT`/`OUTPUT_CONTRACT` shape.

use crate::error::CoreError;
use std::collections::HashSet;

/// A stage's declared input/output field contract, keyed by `RunState` field
/// name.
#[derive(Debug, Clone, Default)]
pub struct StageContract {
    /// Field names this stage requires to be already populated.
    pub required: Vec<&'static str>,
    /// Field names this stage reads if present, but tolerates missing.
    pub optional: Vec<&'static str>,
    /// Field names this stage always populates on success.
    pub guaranteed_outputs: Vec<&'static str>,
    /// Field names this stage populates only along some branches.
    pub conditional_outputs: Vec<&'static str>,
}

impl StageContract {
    /// Check that every `required` field name is present in `available`,
    /// returning `CoreError::InvalidContract` naming the stage and the
    /// fields that were missing.
    pub fn validate(&self, stage: &str, available: &HashSet<&str>) -> Result<(), CoreError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|field| !available.contains(*field))
            .map(|field| field.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidContract {
                stage: stage.to_string(),
                missing,
            })
        }
    }

    /// Every field this stage may produce, guaranteed or conditional.
    pub fn all_outputs(&self) -> Vec<&'static str> {
        self.guaranteed_outputs
            .iter()
            .chain(self.conditional_outputs.iter())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_passes_when_all_required_fields_present() {
        let contract = StageContract {
            required: vec!["docs", "question"],
            ..Default::default()
        };
        let available: HashSet<&str> = ["docs", "question", "category"].into_iter().collect();
        assert!(contract.validate("generate", &available).is_ok());
    }

    #[test]
    fn validate_reports_every_missing_field() {
        let contract = StageContract {
            required: vec!["docs", "question"],
            ..Default::default()
        };
        let available: HashSet<&str> = ["question"].into_iter().collect();
        let err = contract.validate("generate", &available).unwrap_err();
        match err {
            CoreError::InvalidContract { stage, missing } => {
                assert_eq!(stage, "generate");
                assert_eq!(missing, vec!["docs".to_string()]);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
