//! Concrete scanner implementations, split input-side / output-side the
//! way the originating node files are.

pub mod output;
pub mod regex_patterns;

pub use output::{DataLeakageScanner, HallucinationScanner, LeakagePattern, RefusalDetectionScanner, RelevanceScanner};
pub use regex_patterns::{LanguageScanner, NamedPattern, RegexPatternScanner, SecretsScanner, TokenLimitScanner};
