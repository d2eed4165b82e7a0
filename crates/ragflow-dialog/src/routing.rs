//! The `routing` stage's decision logic: consumes the state machine's
//! `action_recommendation` and sets `action` terminally, with a
//! category/intent always-escalate override.
//!
//! Grounded in `original_source/app/nodes/routing/logic.py` and
//! `app/config/conversation_config.py`'s `always_escalate_categories` /
//! `always_escalate_intents`.

use ragflow_core::{Action, ActionRecommendation, RunState};

/// Categories/intents that always escalate regardless of confidence or the
/// state machine's recommendation.
#[derive(Debug, Clone, Default)]
pub struct BlacklistPolicy {
    pub always_escalate_categories: Vec<String>,
    pub always_escalate_intents: Vec<String>,
}

impl BlacklistPolicy {
    fn blacklisted(&self, state: &RunState) -> bool {
        state
            .matched_category
            .as_deref()
            .is_some_and(|c| self.always_escalate_categories.iter().any(|b| b == c))
            || state
                .matched_intent
                .as_deref()
                .is_some_and(|i| self.always_escalate_intents.iter().any(|b| b == i))
    }
}

/// The routing decision: the terminal `action`, and whether a blacklist
/// forced escalation (surfaced in `RunState::escalation_triggered`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub action: Action,
    pub escalation_triggered: bool,
}

/// Decide the terminal action for this turn. `recommendation` is the state
/// machine's `action_recommendation` from the most recent evaluation.
pub fn decide(state: &RunState, recommendation: ActionRecommendation, policy: &BlacklistPolicy) -> RoutingDecision {
    if recommendation == ActionRecommendation::Block {
        return RoutingDecision { action: Action::Block, escalation_triggered: false };
    }

    if policy.blacklisted(state) {
        return RoutingDecision { action: Action::Handoff, escalation_triggered: true };
    }

    let action = if recommendation == ActionRecommendation::Handoff {
        Action::Handoff
    } else {
        Action::AutoReply
    };
    RoutingDecision { action, escalation_triggered: false }
}
