//! Content fingerprints used as deduplication keys.
//!
//! Two digests per message: an exact fingerprint over (source, raw text)
//! that suppresses true reprocessing (e.g. after a restart), and a
//! similarity fingerprint over the normalized significant words that makes
//! near-identical rewrites collide regardless of word order or cosmetic
//! edits. Collisions are the dedup signal — false-positive suppression is
//! the intended effect, so no collision resolution is needed.

use sha2::{Digest, Sha256};

/// Common words stripped before similarity hashing.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "has", "have", "had",
];

/// Number of significant tokens included in the similarity digest.
const SIMILARITY_TOKENS: usize = 10;

/// Exact-duplicate key: SHA-256 over source name and trimmed raw text.
pub fn exact_fingerprint(source: &str, raw_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(raw_text.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Near-duplicate key: normalize, drop stop words and short tokens, sort,
/// take the first [`SIMILARITY_TOKENS`], hash the joined result.
pub fn similarity_fingerprint(text: &str) -> String {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut words: Vec<&str> = normalized
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .collect();
    words.sort_unstable();
    words.dedup();

    let significant = words
        .into_iter()
        .take(SIMILARITY_TOKENS)
        .collect::<Vec<_>>()
        .join(" ");

    let mut hasher = Sha256::new();
    hasher.update(significant.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fingerprint_is_deterministic() {
        let a = exact_fingerprint("worldnews", "Breaking: ceasefire announced");
        let b = exact_fingerprint("worldnews", "Breaking: ceasefire announced");
        assert_eq!(a, b);
    }

    #[test]
    fn exact_fingerprint_distinguishes_sources() {
        let a = exact_fingerprint("worldnews", "same text");
        let b = exact_fingerprint("othernews", "same text");
        assert_ne!(a, b);
    }

    #[test]
    fn exact_fingerprint_trims_whitespace() {
        let a = exact_fingerprint("worldnews", "  padded text \n");
        let b = exact_fingerprint("worldnews", "padded text");
        assert_eq!(a, b);
    }

    #[test]
    fn similarity_ignores_word_order() {
        let a = similarity_fingerprint("government officials confirm ceasefire talks");
        let b = similarity_fingerprint("ceasefire talks confirm government officials");
        assert_eq!(a, b);
    }

    #[test]
    fn similarity_ignores_punctuation_and_case() {
        let a = similarity_fingerprint("Breaking: Government OFFICIALS confirm talks!");
        let b = similarity_fingerprint("breaking government officials confirm talks");
        assert_eq!(a, b);
    }

    #[test]
    fn similarity_drops_stop_words_and_short_tokens() {
        let a = similarity_fingerprint("the officials at UN go to talks");
        let b = similarity_fingerprint("officials talks");
        assert_eq!(a, b);
    }

    #[test]
    fn similarity_differs_for_different_content() {
        let a = similarity_fingerprint("government officials confirm ceasefire");
        let b = similarity_fingerprint("earthquake strikes coastal region overnight");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_text_is_stable() {
        assert_eq!(similarity_fingerprint(""), similarity_fingerprint("   "));
    }
}
