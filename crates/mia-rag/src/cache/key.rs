//! Cache key derivation

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Fixed-length (64 hex chars) digest of a (question, language) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a question in a given language
    ///
    /// Inputs are hashed as-is: no trimming or case folding, so questions that
    /// differ only in whitespace get separate entries. Each field is
    /// length-prefixed so no choice of separator can make two pairs collide.
    pub fn derive(question: &str, language: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((question.len() as u64).to_le_bytes());
        hasher.update(question.as_bytes());
        hasher.update((language.len() as u64).to_le_bytes());
        hasher.update(language.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deterministic() {
        let a = CacheKey::derive("What is aspirin?", "en");
        let b = CacheKey::derive("What is aspirin?", "en");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_prefix() {
        for key in [CacheKey::derive("", ""), CacheKey::derive("سلام", "fa")] {
            assert_eq!(key.as_str().len(), 64);
            assert_eq!(key.short().len(), 12);
            assert!(key.as_str().starts_with(key.short()));
            assert_eq!(serde_json::to_value(&key).unwrap(), key.as_str());
        }
    }

    #[test]
    fn test_language_distinguishes() {
        assert_ne!(
            CacheKey::derive("What is aspirin?", "en"),
            CacheKey::derive("What is aspirin?", "fa")
        );
    }

    #[test]
    fn test_no_normalization() {
        assert_ne!(
            CacheKey::derive("What is aspirin?", "en"),
            CacheKey::derive("What is aspirin? ", "en")
        );
        assert_ne!(
            CacheKey::derive("What is aspirin?", "en"),
            CacheKey::derive("what is aspirin?", "en")
        );
    }

    #[test]
    fn test_separator_ambiguity() {
        // Naive "{question}_{language}" concatenation maps both to "a_b_c"
        assert_ne!(CacheKey::derive("a_b", "c"), CacheKey::derive("a", "b_c"));
    }

    #[test]
    fn test_no_collisions_in_corpus() {
        let mut keys = HashSet::new();
        for i in 0..1000 {
            for lang in ["en", "fa"] {
                let question = format!("Question number {}?", i);
                assert!(keys.insert(CacheKey::derive(&question, lang)));
            }
        }
        assert_eq!(keys.len(), 2000);
    }
}
