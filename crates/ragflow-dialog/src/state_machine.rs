//! The dialog state machine: the seven-step evaluation order that turns
//! dialog-analysis signals plus guardrail/safety/escalation state into a
//! `dialog_state` transition, an `action_recommendation`, and an
//! `escalation_reason`.
//!
//! Grounded in `original_source/app/nodes/state_machine/node.py`'s
//! `_execute_with_rules_engine`.

use crate::rules_engine::RulesEngine;
use ragflow_core::{
    ActionRecommendation, DialogAnalysis, DialogState, EscalationReason, RunState, Sentiment,
    SentimentLabel,
};
use serde_json::{Map, Value, json};

/// The state machine's decision for one turn.
#[derive(Debug, Clone)]
pub struct StateMachineOutcome {
    pub dialog_state: DialogState,
    pub attempt_count: u32,
    pub action_recommendation: ActionRecommendation,
    pub escalation_reason: Option<EscalationReason>,
    pub transition_source: String,
}

/// Wraps a [`RulesEngine`] with the fixed, non-configurable evaluation
/// order every turn follows.
pub struct StateMachine {
    rules: RulesEngine,
}

impl StateMachine {
    pub fn new(rules: RulesEngine) -> Self {
        Self { rules }
    }

    pub fn initial_state(&self) -> DialogState {
        self.rules.initial_state()
    }

    /// Run the seven-step evaluation order against `state`.
    pub fn evaluate(&self, state: &RunState) -> StateMachineOutcome {
        let current_state = state.dialog_state;
        let attempt_count = state.attempt_count;

        // 1. Blocked check, highest priority, bypasses every rule.
        if state.guardrails_blocked() {
            return StateMachineOutcome {
                dialog_state: DialogState::Blocked,
                attempt_count,
                action_recommendation: ActionRecommendation::Block,
                escalation_reason: Some(EscalationReason::GuardrailsBlock),
                transition_source: "guardrails".to_string(),
            };
        }

        // 2. Safety violation, second highest priority.
        if state.safety_violation {
            let behavior = self.rules.state_behavior(DialogState::SafetyViolation);
            return StateMachineOutcome {
                dialog_state: DialogState::SafetyViolation,
                attempt_count,
                action_recommendation: behavior.action,
                escalation_reason: Some(EscalationReason::SafetyViolation),
                transition_source: "safety_violation".to_string(),
            };
        }

        // 3. Routing pre-decision already forced escalation.
        if state.escalation_decision.as_deref() == Some("escalate") {
            let analysis_requested = state
                .dialog_analysis
                .as_ref()
                .map(|a| a.escalation_requested)
                .unwrap_or(false);
            let new_state = if analysis_requested {
                DialogState::EscalationRequested
            } else {
                DialogState::EscalationNeeded
            };
            let behavior = self.rules.state_behavior(new_state);
            let reason = if analysis_requested {
                EscalationReason::UserRequested
            } else {
                EscalationReason::StateMachineDecision
            };
            return StateMachineOutcome {
                dialog_state: new_state,
                attempt_count,
                action_recommendation: behavior.action,
                escalation_reason: Some(reason),
                transition_source: "escalation_override".to_string(),
            };
        }

        // 4. Augment analysis with the derived, state-machine-only signals.
        let mut analysis = state.dialog_analysis.clone().unwrap_or_default();
        analysis.confidence_below_threshold = state.confidence < confidence_threshold(state);
        analysis.requires_handoff = requires_handoff(state);

        // 5 & 6. Walk static rules, then dynamic rules.
        let facts = analysis_facts(&analysis);
        let (result, new_attempt_count) =
            self.rules.evaluate(&facts, current_state, attempt_count);

        let (new_state, transition_source) = match result {
            Some(r) => (r.new_state, r.rule_name),
            None => (current_state, "no_match".to_string()),
        };

        // 7. Empathy override.
        let sentiment_negative = state
            .sentiment
            .as_ref()
            .map(|s: &Sentiment| s.label == SentimentLabel::Negative)
            .unwrap_or(false);
        let max_attempts = self.rules.max_attempts_before_escalation();
        if matches!(new_state, DialogState::AnswerProvided | DialogState::Initial)
            && sentiment_negative
            && new_attempt_count < max_attempts.saturating_sub(1)
        {
            let behavior = self.rules.state_behavior(DialogState::EmpathyMode);
            return StateMachineOutcome {
                dialog_state: DialogState::EmpathyMode,
                attempt_count: new_attempt_count,
                action_recommendation: behavior.action,
                escalation_reason: None,
                transition_source: "sentiment_empathy".to_string(),
            };
        }

        let behavior = self.rules.state_behavior(new_state);
        let escalation_reason = if behavior.action == ActionRecommendation::Handoff {
            Some(resolve_escalation_reason(state, &analysis, &behavior))
        } else {
            None
        };

        StateMachineOutcome {
            dialog_state: new_state,
            attempt_count: new_attempt_count,
            action_recommendation: behavior.action,
            escalation_reason,
            transition_source,
        }
    }
}

fn confidence_threshold(state: &RunState) -> f32 {
    state
        .best_doc_metadata
        .as_ref()
        .and_then(|m| m.confidence_threshold)
        .unwrap_or(0.3)
}

fn requires_handoff(state: &RunState) -> bool {
    if !state.vector_results.is_empty() {
        state
            .vector_results
            .iter()
            .any(|doc| doc.document.metadata.requires_handoff)
    } else {
        state
            .best_doc_metadata
            .as_ref()
            .map(|m| m.requires_handoff)
            .unwrap_or(false)
    }
}

fn analysis_facts(analysis: &DialogAnalysis) -> Map<String, Value> {
    let mut facts = Map::new();
    facts.insert("is_gratitude".into(), json!(analysis.is_gratitude));
    facts.insert("escalation_requested".into(), json!(analysis.escalation_requested));
    facts.insert("is_question".into(), json!(analysis.is_question));
    facts.insert("frustration_detected".into(), json!(analysis.frustration_detected));
    facts.insert("repeated_question".into(), json!(analysis.repeated_question));
    facts.insert(
        "confidence_below_threshold".into(),
        json!(analysis.confidence_below_threshold),
    );
    facts.insert("requires_handoff".into(), json!(analysis.requires_handoff));
    facts
}

fn resolve_escalation_reason(
    state: &RunState,
    analysis: &DialogAnalysis,
    behavior: &ragflow_core::StateBehavior,
) -> EscalationReason {
    if let Some(reason) = &behavior.escalation_reason {
        return match reason.as_str() {
            "safety_violation" => EscalationReason::SafetyViolation,
            "user_requested" => EscalationReason::UserRequested,
            "low_confidence" => EscalationReason::LowConfidence,
            "guardrails_block" => EscalationReason::GuardrailsBlock,
            _ => EscalationReason::StateMachineDecision,
        };
    }
    if state.safety_violation {
        EscalationReason::SafetyViolation
    } else if analysis.escalation_requested {
        EscalationReason::UserRequested
    } else if analysis.confidence_below_threshold {
        EscalationReason::LowConfidence
    } else {
        EscalationReason::StateMachineDecision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules_engine::{Condition, Operator, Rule, RulesEngineConfig};
    use ragflow_core::{GuardrailOutcome, StateBehavior};
    use std::collections::HashMap;

    fn engine_with_behaviors() -> RulesEngine {
        let mut behaviors = HashMap::new();
        behaviors.insert(
            "SAFETY_VIOLATION".to_string(),
            StateBehavior {
                tone: "neutral".into(),
                action: ActionRecommendation::Handoff,
                prompt_hint: "safety".into(),
                escalation_reason: Some("safety_violation".into()),
            },
        );
        behaviors.insert(
            "RESOLVED".to_string(),
            StateBehavior {
                tone: "professional".into(),
                action: ActionRecommendation::AutoReply,
                prompt_hint: "standard".into(),
                escalation_reason: None,
            },
        );
        RulesEngine::new(RulesEngineConfig {
            rules: vec![Rule {
                name: "gratitude".into(),
                description: String::new(),
                condition: Condition {
                    field: "is_gratitude".into(),
                    operator: Operator::Equals,
                    value: json!(true),
                },
                priority: 10,
                requires_attempts_less_than: None,
                requires_attempts_gte: None,
                target_state: DialogState::Resolved,
                actions: vec![],
                post_condition: None,
            }],
            dynamic_rules: vec![],
            defaults: Default::default(),
            state_behaviors: behaviors,
        })
    }

    #[test]
    fn guardrails_block_wins_over_everything() {
        let sm = StateMachine::new(engine_with_behaviors());
        let mut state = RunState::new("hi");
        state.input_guardrails = GuardrailOutcome { blocked: true, ..Default::default() };
        state.safety_violation = true;
        let outcome = sm.evaluate(&state);
        assert_eq!(outcome.dialog_state, DialogState::Blocked);
        assert_eq!(outcome.action_recommendation, ActionRecommendation::Block);
    }

    #[test]
    fn safety_violation_escalates_with_handoff() {
        let sm = StateMachine::new(engine_with_behaviors());
        let mut state = RunState::new("hi");
        state.safety_violation = true;
        let outcome = sm.evaluate(&state);
        assert_eq!(outcome.dialog_state, DialogState::SafetyViolation);
        assert_eq!(outcome.escalation_reason, Some(EscalationReason::SafetyViolation));
    }

    #[test]
    fn escalation_decision_prefers_user_requested_when_analysis_agrees() {
        let sm = StateMachine::new(engine_with_behaviors());
        let mut state = RunState::new("hi");
        state.escalation_decision = Some("escalate".to_string());
        state.dialog_analysis = Some(DialogAnalysis { escalation_requested: true, ..Default::default() });
        let outcome = sm.evaluate(&state);
        assert_eq!(outcome.dialog_state, DialogState::EscalationRequested);
        assert_eq!(outcome.escalation_reason, Some(EscalationReason::UserRequested));
    }

    #[test]
    fn static_rule_match_transitions_to_target_state() {
        let sm = StateMachine::new(engine_with_behaviors());
        let mut state = RunState::new("thanks!");
        state.dialog_analysis = Some(DialogAnalysis { is_gratitude: true, ..Default::default() });
        let outcome = sm.evaluate(&state);
        assert_eq!(outcome.dialog_state, DialogState::Resolved);
        assert_eq!(outcome.transition_source, "gratitude");
    }

    #[test]
    fn empathy_override_applies_with_attempts_remaining() {
        let sm = StateMachine::new(engine_with_behaviors());
        let mut state = RunState::new("still broken");
        state.dialog_state = DialogState::AnswerProvided;
        state.attempt_count = 0;
        state.sentiment = Some(Sentiment { label: SentimentLabel::Negative, score: 0.9 });
        let outcome = sm.evaluate(&state);
        assert_eq!(outcome.dialog_state, DialogState::EmpathyMode);
    }

    #[test]
    fn empathy_override_does_not_apply_near_max_attempts() {
        let sm = StateMachine::new(engine_with_behaviors());
        let mut state = RunState::new("still broken");
        state.dialog_state = DialogState::AnswerProvided;
        state.attempt_count = 2;
        state.sentiment = Some(Sentiment { label: SentimentLabel::Negative, score: 0.9 });
        let outcome = sm.evaluate(&state);
        assert_eq!(outcome.dialog_state, DialogState::AnswerProvided);
    }

    #[test]
    fn no_rule_match_keeps_current_state_with_no_match_source() {
        let sm = StateMachine::new(engine_with_behaviors());
        let state = RunState::new("hi");
        let outcome = sm.evaluate(&state);
        assert_eq!(outcome.dialog_state, DialogState::Initial);
        assert_eq!(outcome.transition_source, "no_match");
    }
}
