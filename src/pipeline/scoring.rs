//! Heuristic quality and bias scoring.
//!
//! Independent of the LLM classifier so that scores exist for every stored
//! item, including rejects. Signals are additive and order-independent;
//! the same text always produces the same scores.

/// Lexicons and weights driving the scorer.
///
/// Kept as data so alternative scoring profiles can be swapped in without
/// touching the scorer itself.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    pub breaking_terms: Vec<String>,
    pub official_terms: Vec<String>,
    pub geo_terms: Vec<String>,
    pub country_terms: Vec<String>,
    pub promo_terms: Vec<String>,
    pub bias_terms: Vec<String>,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        fn owned(terms: &[&str]) -> Vec<String> {
            terms.iter().map(|s| s.to_string()).collect()
        }
        Self {
            breaking_terms: owned(&[
                "breaking", "urgent", "just in", "developing", "latest", "update",
            ]),
            official_terms: owned(&[
                "confirmed", "official", "statement", "announces", "declares", "reports",
            ]),
            geo_terms: owned(&[
                "government",
                "military",
                "president",
                "minister",
                "embassy",
                "border",
                "sanctions",
                "diplomatic",
                "treaty",
                "alliance",
                "conflict",
                "peace",
                "war",
                "crisis",
                "summit",
            ]),
            country_terms: owned(&[
                "russia", "ukraine", "israel", "palestine", "china", "taiwan", "iran", "syria",
                "turkey", "germany", "france", "uk", "usa", "nato", "eu", "un",
            ]),
            promo_terms: owned(&[
                "subscribe", "follow", "join", "channel", "link", "click", "download",
            ]),
            bias_terms: owned(&[
                "zionist",
                "siyonist",
                "zionism",
                "siyonizm",
                "zionist regime",
                "sionist",
                "puppet government",
                "puppet regime",
                "puppet state",
                "evil empire",
                "axis of evil",
                "terrorist state",
                "rogue state",
                "nazi",
                "fascist",
                "terrorist regime",
                "dictator regime",
            ]),
        }
    }
}

/// Quality and bias scores for one piece of text, both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentScores {
    pub quality: f64,
    pub bias: f64,
}

/// Content scorer.
pub struct Scorer {
    policy: ScoringPolicy,
}

impl Scorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Compute quality and bias scores for the given text.
    pub fn score(&self, text: &str) -> ContentScores {
        ContentScores {
            quality: self.quality_score(text),
            bias: self.bias_score(text),
        }
    }

    fn quality_score(&self, text: &str) -> f64 {
        let mut score = 0.5;
        let lower = text.to_lowercase();

        // Length band: optimal around short-post size.
        let length = text.chars().count();
        if (80..=250).contains(&length) {
            score += 0.3;
        } else if (50..=300).contains(&length) {
            score += 0.2;
        } else if length > 300 {
            score -= 0.1;
        }

        score += capped_bonus(&lower, &self.policy.breaking_terms, 0.15, 0.3);
        score += capped_bonus(&lower, &self.policy.official_terms, 0.1, 0.2);
        score += capped_bonus(&lower, &self.policy.geo_terms, 0.15, 0.4);
        score += capped_bonus(&lower, &self.policy.country_terms, 0.1, 0.3);
        score -= capped_bonus(&lower, &self.policy.promo_terms, 0.2, 0.4);

        // Excessive punctuation reads as spam.
        let punctuation = text.matches('!').count()
            + text.matches('?').count()
            + text.matches("...").count();
        if punctuation > 3 {
            score -= 0.2;
        }

        // Proper leading capitalization.
        if text.chars().take(10).any(|c| c.is_uppercase()) {
            score += 0.1;
        }

        score.clamp(0.0, 1.0)
    }

    fn bias_score(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let matches = self
            .policy
            .bias_terms
            .iter()
            .filter(|term| lower.contains(term.as_str()))
            .count();
        (matches as f64 * 0.25).min(1.0)
    }
}

/// Count matching terms and return `count * weight`, capped.
fn capped_bonus(lower_text: &str, terms: &[String], weight: f64, cap: f64) -> f64 {
    let count = terms
        .iter()
        .filter(|term| lower_text.contains(term.as_str()))
        .count();
    (count as f64 * weight).min(cap)
}
