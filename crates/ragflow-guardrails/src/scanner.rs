//! The `Scanner` trait and the context a scan runs against.
//!
//! Grounded in `original_source/app/nodes/input_guardrails/scanner.py`
//! (`RegexScanner`, `TokenLimitScanner`, `LanguageScanner`,
//! `SecretsScanner`) and `output_guardrails/scanner.py`
//! (`DataLeakageScanner`, `RelevanceScanner`, `HallucinationScanner`,
//! `RefusalDetectionScanner`).

use ragflow_core::CoreError;
use std::fmt;

/// Scanner identity. `PromptInjection` and `Secrets` are critical: even in
/// `log` mode, either one triggering forces a block (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScannerKind {
    RegexPatterns,
    TokenLimit,
    Language,
    Secrets,
    PromptInjection,
    Toxicity,
    BanTopics,
    DataLeakage,
    Relevance,
    Hallucination,
    Refusal,
}

impl ScannerKind {
    /// True for the two kinds that force a block regardless of configured
    /// mode.
    pub fn is_critical(self) -> bool {
        matches!(self, ScannerKind::PromptInjection | ScannerKind::Secrets)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScannerKind::RegexPatterns => "regex_patterns",
            ScannerKind::TokenLimit => "token_limit",
            ScannerKind::Language => "language",
            ScannerKind::Secrets => "secrets",
            ScannerKind::PromptInjection => "prompt_injection",
            ScannerKind::Toxicity => "toxicity",
            ScannerKind::BanTopics => "ban_topics",
            ScannerKind::DataLeakage => "data_leakage",
            ScannerKind::Relevance => "relevance",
            ScannerKind::Hallucination => "hallucination",
            ScannerKind::Refusal => "refusal",
        }
    }
}

impl fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ambient information a scanner may need beyond the text it's scanning.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Detected language of the turn, used by `LanguageScanner` and to pick
    /// a localized rejection message.
    pub detected_language: Option<String>,
    /// The original user question, used by output-side scanners (e.g.
    /// `RelevanceScanner`) that compare the answer against it.
    pub user_query: Option<String>,
}

/// Result of one scanner's pass over a text.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub kind: ScannerKind,
    pub triggered: bool,
    /// Risk in `[0, 1]`.
    pub risk_score: f32,
    /// Text with triggered spans replaced, if this scanner can sanitize.
    pub sanitized_text: Option<String>,
}

impl ScanOutcome {
    pub fn clean(kind: ScannerKind) -> Self {
        Self { kind, triggered: false, risk_score: 0.0, sanitized_text: None }
    }
}

/// One check in a guardrails chain.
#[async_trait::async_trait]
pub trait Scanner: Send + Sync {
    fn kind(&self) -> ScannerKind;
    async fn scan(&self, text: &str, ctx: &ScanContext) -> Result<ScanOutcome, CoreError>;
}
