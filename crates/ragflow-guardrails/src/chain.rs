//! Aggregates a chain of [`Scanner`]s into a single [`GuardrailOutcome`],
//! applying the configured [`Mode`].
//!
//! Grounded in `original_source/app/nodes/input_guardrails/node.py`
//! (`InputGuardrailsNode._handle_threat`) and
//! `output_guardrails/scanner.py` (`BasicOutputGuardrailsService.scan`).

use crate::scanner::{ScanContext, Scanner, ScannerKind};
use ragflow_core::{CoreError, GuardrailOutcome};
use regex::Regex;
use std::sync::OnceLock;

/// How a chain responds once a scanner triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stop the pipeline; the caller substitutes a safe rejection message.
    Block,
    /// Annotate and continue, except for critical scanner kinds which force
    /// a block regardless.
    Log,
    /// Replace triggered spans with the scanner's sanitized text and
    /// continue.
    Sanitize,
}

/// Non-critical scanner kinds whose triggers are downgraded to a warning
/// when the input looks like a legitimate support query — mirrors
/// `InputGuardrailsNode`'s `support_whitelist_patterns` override.
fn support_whitelist_patterns() -> [&'static str; 5] {
    [
        r"(?i)(black|white)\s+(screen|page)",
        r"(?i)(login|password|credentials|authentication)",
        r"(?i)(won't accept|can't log in|error logging)",
        r"(?i)(website|app|service).*(down|slow|not working)",
        r"(?i)(crazy|insane|ridiculous).*(website|service|app|support)",
    ]
}

static WHITELIST: OnceLock<Vec<Regex>> = OnceLock::new();

fn is_support_query(text: &str) -> bool {
    let patterns =
        WHITELIST.get_or_init(|| support_whitelist_patterns().iter().map(|p| Regex::new(p).unwrap()).collect());
    patterns.iter().any(|re| re.is_match(text))
}

/// Scanner kinds that the support-query whitelist is permitted to downgrade
/// from a block/warning to a pass.
fn is_whitelist_downgradable(kind: ScannerKind) -> bool {
    matches!(kind, ScannerKind::BanTopics | ScannerKind::Toxicity)
}

/// An ordered list of scanners plus the mode to apply when one triggers.
pub struct ScannerChain {
    scanners: Vec<Box<dyn Scanner>>,
    mode: Mode,
}

impl ScannerChain {
    pub fn new(scanners: Vec<Box<dyn Scanner>>, mode: Mode) -> Self {
        Self { scanners, mode }
    }

    /// Runs every scanner, aggregates the max risk score and the set of
    /// triggered names, then applies the chain's mode. `text` is checked
    /// for the support-query whitelist only when scanning user input on
    /// the input side; output-side callers pass an empty `ctx.user_query`
    /// and the whitelist has no effect there since `BanTopics`/`Toxicity`
    /// are input-only scanner kinds.
    pub async fn scan(&self, text: &str, ctx: &ScanContext) -> Result<(GuardrailOutcome, Option<String>), CoreError> {
        let mut triggered = Vec::new();
        let mut risk_score: f32 = 0.0;
        let mut sanitized_text: Option<String> = None;
        let mut current = text.to_string();

        for scanner in &self.scanners {
            let outcome = scanner.scan(&current, ctx).await?;
            risk_score = risk_score.max(outcome.risk_score);
            if outcome.triggered {
                triggered.push(outcome.kind);
                if let Some(sanitized) = outcome.sanitized_text {
                    current = sanitized.clone();
                    sanitized_text = Some(sanitized);
                }
            }
        }

        if triggered.is_empty() {
            return Ok((
                GuardrailOutcome { passed: true, blocked: false, warning: false, sanitized: false, triggered: Vec::new(), risk_score },
                None,
            ));
        }

        let whitelisted = is_support_query(text);
        let remaining: Vec<ScannerKind> = if whitelisted {
            triggered.iter().copied().filter(|k| !is_whitelist_downgradable(*k)).collect()
        } else {
            triggered.clone()
        };

        if whitelisted && remaining.is_empty() {
            return Ok((
                GuardrailOutcome {
                    passed: false,
                    blocked: false,
                    warning: true,
                    sanitized: false,
                    triggered: triggered.iter().map(|k| k.to_string()).collect(),
                    risk_score,
                },
                None,
            ));
        }

        let names: Vec<String> = remaining.iter().map(|k| k.to_string()).collect();

        match self.mode {
            Mode::Block => Ok((
                GuardrailOutcome { passed: false, blocked: true, warning: false, sanitized: false, triggered: names, risk_score },
                None,
            )),
            Mode::Log => {
                let critical = remaining.iter().any(|k| k.is_critical());
                if critical {
                    Ok((
                        GuardrailOutcome {
                            passed: false,
                            blocked: true,
                            warning: false,
                            sanitized: false,
                            triggered: names,
                            risk_score,
                        },
                        None,
                    ))
                } else {
                    Ok((
                        GuardrailOutcome {
                            passed: false,
                            blocked: false,
                            warning: true,
                            sanitized: false,
                            triggered: names,
                            risk_score,
                        },
                        None,
                    ))
                }
            }
            Mode::Sanitize => Ok((
                GuardrailOutcome {
                    passed: false,
                    blocked: false,
                    warning: false,
                    sanitized: sanitized_text.is_some(),
                    triggered: names,
                    risk_score,
                },
                sanitized_text,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ScanOutcome;

    struct FixedScanner {
        kind: ScannerKind,
        outcome: ScanOutcome,
    }

    #[async_trait::async_trait]
    impl Scanner for FixedScanner {
        fn kind(&self) -> ScannerKind {
            self.kind
        }
        async fn scan(&self, _text: &str, _ctx: &ScanContext) -> Result<ScanOutcome, CoreError> {
            Ok(self.outcome.clone())
        }
    }

    fn triggered(kind: ScannerKind, risk: f32) -> Box<dyn Scanner> {
        Box::new(FixedScanner { kind, outcome: ScanOutcome { kind, triggered: true, risk_score: risk, sanitized_text: None } })
    }

    #[tokio::test]
    async fn block_mode_blocks_on_any_trigger() {
        let chain = ScannerChain::new(vec![triggered(ScannerKind::RegexPatterns, 0.3)], Mode::Block);
        let (outcome, _) = chain.scan("free instructions to ignore safety", &ScanContext::default()).await.unwrap();
        assert!(outcome.blocked);
    }

    #[tokio::test]
    async fn log_mode_warns_on_non_critical_trigger() {
        let chain = ScannerChain::new(vec![triggered(ScannerKind::Toxicity, 0.4)], Mode::Log);
        let (outcome, _) = chain.scan("you are all idiots and useless", &ScanContext::default()).await.unwrap();
        assert!(!outcome.blocked);
        assert!(outcome.warning);
    }

    #[tokio::test]
    async fn log_mode_force_blocks_on_critical_trigger() {
        let chain = ScannerChain::new(vec![triggered(ScannerKind::Secrets, 1.0)], Mode::Log);
        let (outcome, _) = chain.scan("sk-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", &ScanContext::default()).await.unwrap();
        assert!(outcome.blocked);
    }

    #[tokio::test]
    async fn support_whitelist_downgrades_non_critical_to_warning() {
        let chain = ScannerChain::new(vec![triggered(ScannerKind::BanTopics, 0.5)], Mode::Block);
        let (outcome, _) = chain.scan("the website is down and it's crazy", &ScanContext::default()).await.unwrap();
        assert!(!outcome.blocked);
        assert!(outcome.warning);
    }

    #[tokio::test]
    async fn clean_scan_passes() {
        let chain = ScannerChain::new(vec![], Mode::Block);
        let (outcome, _) = chain.scan("hello there", &ScanContext::default()).await.unwrap();
        assert!(outcome.passed);
    }
}
