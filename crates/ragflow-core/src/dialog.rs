//! The dialog state machine's state space and per-state behavior.
//!
//! Grounded in the state names imported from `states_config.py` in
//! `original_source/app/nodes/state_machine/node.py` (`INITIAL`,
//! `ANSWER_PROVIDED`, `ESCALATION_NEEDED`, `ESCALATION_REQUESTED`,
//! `SAFETY_VIOLATION`, `EMPATHY_MODE`, `BLOCKED`, `LOW_CONFIDENCE`,
//! `STUCK_LOOP`) — `states_config.py` itself was not captured in this pack.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node in the dialog state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogState {
    /// No turns have been classified yet for this session.
    Initial,
    /// The pipeline produced an auto-reply answer for the current turn.
    AnswerProvided,
    /// The best matching document needs clarification before answering.
    AwaitingClarification,
    /// The conversation was resolved to the user's satisfaction.
    Resolved,
    /// Escalation is warranted by pipeline signals other than an explicit
    /// user request (e.g. repeated failures, low confidence).
    EscalationNeeded,
    /// The user explicitly asked to talk to a human.
    EscalationRequested,
    /// An output or input guardrail detected a safety violation.
    SafetyViolation,
    /// Negative sentiment detected with attempts remaining; answer with an
    /// empathetic tone instead of escalating immediately.
    EmpathyMode,
    /// A guardrail blocked the turn outright.
    Blocked,
    /// Retrieval confidence fell below the configured threshold.
    LowConfidence,
    /// The same question has been asked repeatedly without resolution.
    StuckLoop,
}

impl Default for DialogState {
    fn default() -> Self {
        DialogState::Initial
    }
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogState::Initial => "INITIAL",
            DialogState::AnswerProvided => "ANSWER_PROVIDED",
            DialogState::AwaitingClarification => "AWAITING_CLARIFICATION",
            DialogState::Resolved => "RESOLVED",
            DialogState::EscalationNeeded => "ESCALATION_NEEDED",
            DialogState::EscalationRequested => "ESCALATION_REQUESTED",
            DialogState::SafetyViolation => "SAFETY_VIOLATION",
            DialogState::EmpathyMode => "EMPATHY_MODE",
            DialogState::Blocked => "BLOCKED",
            DialogState::LowConfidence => "LOW_CONFIDENCE",
            DialogState::StuckLoop => "STUCK_LOOP",
        };
        f.write_str(s)
    }
}

impl DialogState {
    /// Parse a state from its canonical `SCREAMING_SNAKE_CASE` name, as used
    /// in rules-engine configuration documents.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "INITIAL" => DialogState::Initial,
            "ANSWER_PROVIDED" => DialogState::AnswerProvided,
            "AWAITING_CLARIFICATION" => DialogState::AwaitingClarification,
            "RESOLVED" => DialogState::Resolved,
            "ESCALATION_NEEDED" => DialogState::EscalationNeeded,
            "ESCALATION_REQUESTED" => DialogState::EscalationRequested,
            "SAFETY_VIOLATION" => DialogState::SafetyViolation,
            "EMPATHY_MODE" => DialogState::EmpathyMode,
            "BLOCKED" => DialogState::Blocked,
            "LOW_CONFIDENCE" => DialogState::LowConfidence,
            "STUCK_LOOP" => DialogState::StuckLoop,
            _ => return None,
        })
    }
}

/// The recommended action a dialog state implies, independent of the
/// terminal `RunState::action` field the routing stage ultimately sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRecommendation {
    /// Generate and send an automatic answer.
    AutoReply,
    /// Hand the conversation off to a human operator.
    Handoff,
    /// Stop the pipeline; a guardrail rejection message is the answer.
    Block,
}

/// Per-state behavior, used by prompt routing and by the routing stage to
/// resolve `action_recommendation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateBehavior {
    /// Tone hint for generation (e.g. "professional", "empathetic").
    pub tone: String,
    /// The action this state implies.
    pub action: ActionRecommendation,
    /// A hint consumed by prompt construction to select a system prompt
    /// variant.
    pub prompt_hint: String,
    /// Default escalation reason for this state, if `action == Handoff`.
    pub escalation_reason: Option<String>,
}

impl Default for StateBehavior {
    fn default() -> Self {
        Self {
            tone: "professional".to_string(),
            action: ActionRecommendation::AutoReply,
            prompt_hint: "standard".to_string(),
            escalation_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        for state in [
            DialogState::Initial,
            DialogState::AnswerProvided,
            DialogState::AwaitingClarification,
            DialogState::Resolved,
            DialogState::EscalationNeeded,
            DialogState::EscalationRequested,
            DialogState::SafetyViolation,
            DialogState::EmpathyMode,
            DialogState::Blocked,
            DialogState::LowConfidence,
            DialogState::StuckLoop,
        ] {
            let name = state.to_string();
            assert_eq!(DialogState::parse(&name), Some(state));
        }
    }

    #[test]
    fn unknown_name_does_not_parse() {
        assert_eq!(DialogState::parse("NOT_A_STATE"), None);
    }
}
