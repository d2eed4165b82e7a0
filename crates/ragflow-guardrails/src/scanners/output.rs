//! Output-side scanners: data leakage, relevance, hallucination, refusal.
//!
//! Grounded in `original_source/app/nodes/output_guardrails/scanner.py`
//! (`DataLeakageScanner`, `RelevanceScanner`, `HallucinationScanner`,
//! `RefusalDetectionScanner`).

use crate::scanner::{ScanContext, ScanOutcome, Scanner, ScannerKind};
use ragflow_core::CoreError;
use regex::Regex;

/// A pattern describing a class of leakable data (PII, credentials, ...).
#[derive(Debug, Clone)]
pub struct LeakagePattern {
    pub description: String,
    pub regex: Regex,
}

/// Scans generated answers for PII/credential patterns and can sanitize by
/// replacing matches with a redaction marker — mirrors `DataLeakageScanner`.
pub struct DataLeakageScanner {
    patterns: Vec<LeakagePattern>,
}

impl DataLeakageScanner {
    pub fn new(patterns: Vec<LeakagePattern>) -> Self {
        Self { patterns }
    }
}

#[async_trait::async_trait]
impl Scanner for DataLeakageScanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::DataLeakage
    }

    async fn scan(&self, text: &str, _ctx: &ScanContext) -> Result<ScanOutcome, CoreError> {
        let mut hits = 0usize;
        let mut sanitized = text.to_string();
        for pattern in &self.patterns {
            if pattern.regex.is_match(&sanitized) {
                hits += 1;
                sanitized = pattern.regex.replace_all(&sanitized, "[REDACTED]").into_owned();
            }
        }
        let triggered = hits > 0;
        Ok(ScanOutcome {
            kind: ScannerKind::DataLeakage,
            triggered,
            risk_score: (hits as f32 * 0.4).min(1.0),
            sanitized_text: triggered.then_some(sanitized),
        })
    }
}

const OFF_TOPIC_PHRASES: &[&str] = &[
    "я не могу помочь с этим",
    "это не входит в мои обязанности",
    "это за пределами моих возможностей",
    "обратитесь к другому специалисту",
    "i cannot help with that",
    "this is outside my scope",
    "contact another specialist",
];

/// Flags off-topic refusal phrasing and suspiciously short answers —
/// mirrors `RelevanceScanner.scan`.
pub struct RelevanceScanner;

impl RelevanceScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RelevanceScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Scanner for RelevanceScanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Relevance
    }

    async fn scan(&self, text: &str, _ctx: &ScanContext) -> Result<ScanOutcome, CoreError> {
        let lower = text.to_lowercase();
        if OFF_TOPIC_PHRASES.iter().any(|p| lower.contains(p)) {
            return Ok(ScanOutcome {
                kind: ScannerKind::Relevance,
                triggered: true,
                risk_score: 0.8,
                sanitized_text: None,
            });
        }
        if text.trim().len() < 20 {
            return Ok(ScanOutcome {
                kind: ScannerKind::Relevance,
                triggered: true,
                risk_score: 0.3,
                sanitized_text: None,
            });
        }
        Ok(ScanOutcome::clean(ScannerKind::Relevance))
    }
}

/// Counts uncertainty-indicator keywords (e.g. "I think", "possibly") and
/// flags answers whose resulting risk crosses a configured threshold —
/// mirrors `HallucinationScanner.scan`.
pub struct HallucinationScanner {
    indicators: Vec<String>,
    threshold: f32,
}

impl HallucinationScanner {
    pub fn new(indicators: Vec<String>, threshold: f32) -> Self {
        Self { indicators, threshold }
    }
}

#[async_trait::async_trait]
impl Scanner for HallucinationScanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Hallucination
    }

    async fn scan(&self, text: &str, _ctx: &ScanContext) -> Result<ScanOutcome, CoreError> {
        let lower = text.to_lowercase();
        let found = self.indicators.iter().filter(|i| lower.contains(i.to_lowercase().as_str())).count();
        let risk_score = (found as f32 * 0.2).min(1.0);
        Ok(ScanOutcome {
            kind: ScannerKind::Hallucination,
            triggered: risk_score >= self.threshold,
            risk_score,
            sanitized_text: None,
        })
    }
}

fn refusal_patterns() -> [&'static str; 4] {
    [
        r"(?i)я не могу.*ответить",
        r"(?i)извините.*не могу помочь",
        r"(?i)I cannot.*answer",
        r"(?i)I'm sorry.*I can't help",
    ]
}

/// Detects model refusals to a legitimate request — mirrors
/// `RefusalDetectionScanner.scan`.
pub struct RefusalDetectionScanner {
    compiled: Vec<Regex>,
}

impl RefusalDetectionScanner {
    pub fn new() -> Result<Self, regex::Error> {
        let compiled = refusal_patterns().iter().map(|p| Regex::new(p)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { compiled })
    }
}

impl Default for RefusalDetectionScanner {
    fn default() -> Self {
        Self::new().expect("refusal scanner patterns are compile-time constants")
    }
}

#[async_trait::async_trait]
impl Scanner for RefusalDetectionScanner {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Refusal
    }

    async fn scan(&self, text: &str, _ctx: &ScanContext) -> Result<ScanOutcome, CoreError> {
        let triggered = self.compiled.iter().any(|re| re.is_match(text));
        Ok(ScanOutcome {
            kind: ScannerKind::Refusal,
            triggered,
            risk_score: if triggered { 0.8 } else { 0.0 },
            sanitized_text: None,
        })
    }
}
