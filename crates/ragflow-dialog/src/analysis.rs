//! `DialogAnalyzer`: two interchangeable implementations producing the five
//! dialog-analysis booleans plus a sentiment record.
//!
//! Grounded in `original_source/app/nodes/dialog_analysis/node.py`
//! (`regex_dialog_analysis_node`) and `llm.py` (`llm_dialog_analysis_node`).

use async_trait::async_trait;
use ragflow_core::{CoreError, DialogAnalysis, Message, Role, Sentiment, SentimentLabel};
use regex::Regex;
use std::sync::OnceLock;

const GRATITUDE_KEYWORDS: &[&str] = &[
    "thank", "thanks", "thx", "appreciate", "good job", "спасибо", "благодарю", "спс", "класс",
    "молодец",
];
const ESCALATION_KEYWORDS: &[&str] = &[
    "human", "agent", "person", "operator", "talk to someone", "support team", "человек",
    "оператор", "агент", "сотрудник", "менеджер", "позови", "переключи",
];
const QUESTION_STARTERS: &[&str] = &[
    "what", "how", "why", "when", "can", "is", "are", "do", "does", "что", "как", "почему",
    "когда", "можно", "можешь", "расскажи", "подскажи",
];
const FRUSTRATION_KEYWORDS: &[&str] = &[
    "stupid", "useless", "bad", "wrong", "broke", "hate", "idiot", "тупой", "глупый",
    "бесполезный", "плохой", "ужас", "бред", "идиот",
];

/// Produces [`DialogAnalysis`] and [`Sentiment`] for the current turn.
/// Implementations must not block; LLM-backed implementations should treat
/// a malformed response the same way the regex path treats absence of a
/// signal — default to `false`, never propagate a parse error upward as a
/// pipeline failure.
#[async_trait]
pub trait DialogAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        question: &str,
        history: &[Message],
    ) -> Result<(DialogAnalysis, Sentiment), CoreError>;
}

static NON_WORD: OnceLock<Regex> = OnceLock::new();

/// Mirrors `node.py`'s `re.sub(r'[^\w\s]', '', s)` normalization used before
/// comparing the current question to the last user turn.
fn strip_punctuation(s: &str) -> String {
    let re = NON_WORD.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    re.replace_all(s, "").trim().to_string()
}

/// Pure keyword/regex dialog analysis: no model call, English and Russian
/// keyword lists, and an exact-match-after-normalization repeated-question
/// check against the last user turn.
#[derive(Debug, Default)]
pub struct RegexDialogAnalyzer;

impl RegexDialogAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DialogAnalyzer for RegexDialogAnalyzer {
    async fn analyze(
        &self,
        question: &str,
        history: &[Message],
    ) -> Result<(DialogAnalysis, Sentiment), CoreError> {
        let lower = question.to_lowercase();

        let is_gratitude = GRATITUDE_KEYWORDS.iter().any(|k| lower.contains(k));
        let escalation_requested = ESCALATION_KEYWORDS.iter().any(|k| lower.contains(k));
        let is_question = lower.contains('?')
            || QUESTION_STARTERS.iter().any(|w| lower.trim_start().starts_with(w));
        let frustration_detected = FRUSTRATION_KEYWORDS.iter().any(|k| lower.contains(k));

        let last_user_message = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.to_lowercase());
        let repeated_question = last_user_message
            .map(|last| strip_punctuation(&last) == strip_punctuation(&lower))
            .unwrap_or(false);

        let analysis = DialogAnalysis {
            is_gratitude,
            escalation_requested,
            is_question,
            frustration_detected,
            repeated_question,
            confidence_below_threshold: false,
            requires_handoff: false,
        };

        let sentiment = if frustration_detected {
            Sentiment { label: SentimentLabel::Negative, score: 0.8 }
        } else if is_gratitude {
            Sentiment { label: SentimentLabel::Positive, score: 0.8 }
        } else {
            Sentiment { label: SentimentLabel::Neutral, score: 0.5 }
        };

        Ok((analysis, sentiment))
    }
}

/// Calls a structured-output model to extract the same five signals plus
/// sentiment from the conversation history, mirroring `llm.py`'s prompt.
/// Kept generic over any client implementing [`DialogLlmClient`] so tests
/// can supply a fixed response without a network call.
#[async_trait]
pub trait DialogLlmClient: Send + Sync {
    /// Returns the parsed analysis and sentiment, or `None` if the model
    /// call or JSON parse failed — the caller falls back to safe defaults,
    /// matching `llm.py`'s `except` branch.
    async fn analyze(
        &self,
        question: &str,
        history: &[Message],
    ) -> Result<Option<(DialogAnalysis, Sentiment)>, CoreError>;
}

/// Wraps a [`DialogLlmClient`], falling back to `is_question = true` and
/// every other signal `false` on failure, exactly as `llm.py` does.
pub struct LlmDialogAnalyzer<C: DialogLlmClient> {
    client: C,
}

impl<C: DialogLlmClient> LlmDialogAnalyzer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: DialogLlmClient> DialogAnalyzer for LlmDialogAnalyzer<C> {
    async fn analyze(
        &self,
        question: &str,
        history: &[Message],
    ) -> Result<(DialogAnalysis, Sentiment), CoreError> {
        match self.client.analyze(question, history).await? {
            Some(result) => Ok(result),
            None => Ok((
                DialogAnalysis {
                    is_gratitude: false,
                    escalation_requested: false,
                    is_question: true,
                    frustration_detected: false,
                    repeated_question: false,
                    confidence_below_threshold: false,
                    requires_handoff: false,
                },
                Sentiment { label: SentimentLabel::Neutral, score: 0.5 },
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_msg(content: &str) -> Message {
        Message {
            id: None,
            role: Role::User,
            content: content.to_string(),
            timestamp: None,
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn detects_gratitude_in_english_and_russian() {
        let analyzer = RegexDialogAnalyzer::new();
        let (analysis, sentiment) = analyzer.analyze("thanks a lot!", &[]).await.unwrap();
        assert!(analysis.is_gratitude);
        assert_eq!(sentiment.label, SentimentLabel::Positive);

        let (analysis, _) = analyzer.analyze("спасибо большое", &[]).await.unwrap();
        assert!(analysis.is_gratitude);
    }

    #[tokio::test]
    async fn detects_escalation_request() {
        let analyzer = RegexDialogAnalyzer::new();
        let (analysis, _) = analyzer.analyze("let me talk to a human", &[]).await.unwrap();
        assert!(analysis.escalation_requested);
    }

    #[tokio::test]
    async fn frustration_sets_negative_sentiment() {
        let analyzer = RegexDialogAnalyzer::new();
        let (analysis, sentiment) = analyzer.analyze("this is useless", &[]).await.unwrap();
        assert!(analysis.frustration_detected);
        assert_eq!(sentiment.label, SentimentLabel::Negative);
    }

    #[tokio::test]
    async fn repeated_question_ignores_punctuation_and_case() {
        let analyzer = RegexDialogAnalyzer::new();
        let history = vec![user_msg("Where is my order?")];
        let (analysis, _) = analyzer.analyze("where is my order", &history).await.unwrap();
        assert!(analysis.repeated_question);
    }

    struct FailingLlm;

    #[async_trait]
    impl DialogLlmClient for FailingLlm {
        async fn analyze(
            &self,
            _question: &str,
            _history: &[Message],
        ) -> Result<Option<(DialogAnalysis, Sentiment)>, CoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn llm_analyzer_falls_back_to_safe_defaults_on_failure() {
        let analyzer = LlmDialogAnalyzer::new(FailingLlm);
        let (analysis, _) = analyzer.analyze("hi", &[]).await.unwrap();
        assert!(analysis.is_question);
        assert!(!analysis.is_gratitude);
    }
}
