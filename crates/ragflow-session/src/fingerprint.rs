//! Cache key fingerprinting (spec.md §4.9): a fingerprint of
//! `{normalized question, user_id or channel, optionally language +
//! category}`.

use sha2::{Digest, Sha256};

fn normalize_question(question: &str) -> String {
    question.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Scope a cache entry is keyed within, beyond the question text itself.
#[derive(Debug, Default, Clone)]
pub struct FingerprintScope<'a> {
    pub user_or_channel: Option<&'a str>,
    pub language: Option<&'a str>,
    pub category: Option<&'a str>,
}

/// Deterministic fingerprint for a cache lookup/write.
pub fn fingerprint(question: &str, scope: &FingerprintScope<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_question(question).as_bytes());
    hasher.update(b"|");
    hasher.update(scope.user_or_channel.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(scope.language.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(scope.category.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_ignores_case_and_extra_whitespace() {
        let scope = FingerprintScope { user_or_channel: Some("u1"), ..Default::default() };
        let a = fingerprint("Where   is my ORDER?", &scope);
        let b = fingerprint("where is my order?", &scope);
        assert_eq!(a, b);
    }

    #[test]
    fn different_scopes_produce_different_fingerprints() {
        let a = fingerprint("hi", &FingerprintScope { user_or_channel: Some("u1"), ..Default::default() });
        let b = fingerprint("hi", &FingerprintScope { user_or_channel: Some("u2"), ..Default::default() });
        assert_ne!(a, b);
    }

    #[test]
    fn language_and_category_are_part_of_the_key() {
        let base = FingerprintScope { user_or_channel: Some("u1"), ..Default::default() };
        let with_lang = FingerprintScope { language: Some("en"), ..base.clone() };
        assert_ne!(fingerprint("hi", &base), fingerprint("hi", &with_lang));
    }
}
