//! The declarative rules engine: a data-driven evaluator, independent of the
//! dialog domain it happens to be configured for.
//!
//! Grounded in `original_source/app/nodes/state_machine/rules_engine.py`'s
//! `RulesEngine` class: static rules in ascending priority order, then
//! dynamic rules, operating over a fact bag rather than hardcoded Python
//! conditionals.

use ragflow_core::{DialogState, StateBehavior};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Comparison operators a [`Condition`] may use against the fact bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
    NotIn,
    Exists,
}

/// One condition: `field <operator> value`, evaluated against a fact bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    #[serde(default = "default_operator")]
    pub operator: Operator,
    pub value: Value,
}

fn default_operator() -> Operator {
    Operator::Equals
}

/// Side effects a matched rule applies to the running attempt count, or a
/// no-op marker kept purely for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    ResetAttemptCount,
    IncrementAttempts,
    Log,
}

/// Overrides `target_state` when the running attempt count, after actions
/// have applied, exceeds a threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCondition {
    pub if_attempts_exceed: u32,
    pub override_state: DialogState,
}

/// One static, priority-ordered transition rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    #[serde(default = "default_priority")]
    pub priority: i64,
    /// Skip this rule once `attempt_count` reaches this value.
    pub requires_attempts_less_than: Option<u32>,
    /// Skip this rule until `attempt_count` reaches this value.
    pub requires_attempts_gte: Option<u32>,
    pub target_state: DialogState,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    pub post_condition: Option<PostCondition>,
}

fn default_priority() -> i64 {
    100
}

/// The one dynamic condition type the original system defines: attempt
/// count crossing a threshold read out of `defaults`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicConditionKind {
    AttemptsExceeded,
}

/// A dynamic rule's condition: a kind plus the name of the `defaults` key
/// its threshold is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicCondition {
    #[serde(rename = "type")]
    pub kind: DynamicConditionKind,
    pub threshold_from_config: String,
}

/// A rule evaluated only after every static rule has failed to match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: DynamicCondition,
    pub requires_current_state: Option<DialogState>,
    pub target_state: DialogState,
}

/// Global defaults for the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "DialogState::default")]
    pub initial_state: DialogState,
    #[serde(default = "default_max_attempts")]
    pub max_attempts_before_escalation: u32,
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            initial_state: DialogState::default(),
            max_attempts_before_escalation: default_max_attempts(),
        }
    }
}

/// The full declarative rules document: static rules, dynamic rules,
/// defaults, and per-state behavior hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesEngineConfig {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub dynamic_rules: Vec<DynamicRule>,
    #[serde(default)]
    pub defaults: Defaults,
    /// Keyed by `DialogState`'s `SCREAMING_SNAKE_CASE` name (`to_string()`),
    /// not the enum itself — `serde_json`'s object maps require string keys.
    #[serde(default)]
    pub state_behaviors: HashMap<String, StateBehavior>,
}

/// Outcome of a matched rule: the new state, which rule matched (for
/// `transition_source`), and the actions it requested.
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub new_state: DialogState,
    pub rule_name: String,
    pub actions: Vec<RuleAction>,
}

fn check_condition(condition: &Condition, facts: &Map<String, Value>) -> bool {
    let actual = facts.get(&condition.field);
    let expected = &condition.value;

    match condition.operator {
        Operator::Equals => actual == Some(expected),
        Operator::NotEquals => actual != Some(expected),
        Operator::Gt => compare_numeric(actual, expected, |a, b| a > b),
        Operator::Lt => compare_numeric(actual, expected, |a, b| a < b),
        Operator::Gte => compare_numeric(actual, expected, |a, b| a >= b),
        Operator::Lte => compare_numeric(actual, expected, |a, b| a <= b),
        Operator::In => expected
            .as_array()
            .map(|list| actual.is_some_and(|v| list.contains(v)))
            .unwrap_or(false),
        Operator::NotIn => expected
            .as_array()
            .map(|list| !actual.is_some_and(|v| list.contains(v)))
            .unwrap_or(true),
        Operator::Exists => expected
            .as_bool()
            .map(|want_present| actual.is_some() == want_present)
            .unwrap_or(false),
    }
}

fn compare_numeric(actual: Option<&Value>, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(Value::as_f64), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// The rules engine proper: static rules pre-sorted by ascending priority,
/// dynamic rules in document order, and the defaults/behaviors they
/// reference.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    rules: Vec<Rule>,
    dynamic_rules: Vec<DynamicRule>,
    defaults: Defaults,
    state_behaviors: HashMap<String, StateBehavior>,
}

impl RulesEngine {
    /// Build an engine from a parsed configuration, sorting static rules by
    /// priority once up front.
    pub fn new(mut config: RulesEngineConfig) -> Self {
        config.rules.sort_by_key(|r| r.priority);
        Self {
            rules: config.rules,
            dynamic_rules: config.dynamic_rules,
            defaults: config.defaults,
            state_behaviors: config.state_behaviors,
        }
    }

    pub fn initial_state(&self) -> DialogState {
        self.defaults.initial_state
    }

    pub fn max_attempts_before_escalation(&self) -> u32 {
        self.defaults.max_attempts_before_escalation
    }

    /// Behavior hints for `state`, falling back to the library default
    /// (professional tone, auto_reply) when the configuration is silent on
    /// it.
    pub fn state_behavior(&self, state: DialogState) -> StateBehavior {
        self.state_behaviors
            .get(&state.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Evaluate static rules, then dynamic rules, against `facts`. Returns
    /// the matched transition (if any) and the attempt count after actions
    /// have applied.
    pub fn evaluate(
        &self,
        facts: &Map<String, Value>,
        current_state: DialogState,
        attempt_count: u32,
    ) -> (Option<TransitionResult>, u32) {
        let mut new_attempt_count = attempt_count;

        for rule in &self.rules {
            if let Some(lt) = rule.requires_attempts_less_than {
                if attempt_count >= lt {
                    continue;
                }
            }
            if let Some(gte) = rule.requires_attempts_gte {
                if attempt_count < gte {
                    continue;
                }
            }

            if !check_condition(&rule.condition, facts) {
                continue;
            }

            for action in &rule.actions {
                match action {
                    RuleAction::ResetAttemptCount => new_attempt_count = 0,
                    RuleAction::IncrementAttempts => new_attempt_count += 1,
                    RuleAction::Log => {}
                }
            }

            let mut new_state = rule.target_state;
            if let Some(post) = &rule.post_condition {
                if new_attempt_count > post.if_attempts_exceed {
                    new_state = post.override_state;
                }
            }

            return (
                Some(TransitionResult {
                    new_state,
                    rule_name: if rule.name.is_empty() {
                        "unknown".to_string()
                    } else {
                        rule.name.clone()
                    },
                    actions: rule.actions.clone(),
                }),
                new_attempt_count,
            );
        }

        for dyn_rule in &self.dynamic_rules {
            if let Some(requires) = dyn_rule.requires_current_state {
                if requires != current_state {
                    continue;
                }
            }

            let DynamicConditionKind::AttemptsExceeded = dyn_rule.condition.kind;
            let threshold = match dyn_rule.condition.threshold_from_config.as_str() {
                "max_attempts_before_escalation" => self.defaults.max_attempts_before_escalation,
                _ => self.defaults.max_attempts_before_escalation,
            };

            if new_attempt_count > threshold {
                return (
                    Some(TransitionResult {
                        new_state: dyn_rule.target_state,
                        rule_name: if dyn_rule.name.is_empty() {
                            "dynamic".to_string()
                        } else {
                            dyn_rule.name.clone()
                        },
                        actions: vec![],
                    }),
                    new_attempt_count,
                );
            }
        }

        (None, new_attempt_count)
    }
}
