//! Pre-classifier content filter.
//!
//! Runs before fingerprint persistence and before the LLM call to
//! short-circuit obvious rejects cheaply: disallowed senders, blocked
//! keywords, links and promo symbols, messages still inside the edit
//! window, and already-handled duplicates. Rule order matters for the
//! diagnostics, not for correctness.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info};

use crate::pipeline::types::{RejectReason, SourceMessage};

/// Rule data for the content filter.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// Case-insensitive substrings that reject a message outright.
    pub blocked_keywords: Vec<String>,
    /// Single symbols (celebration emoji and similar promo markers) that
    /// reject a message.
    pub blocked_symbols: Vec<char>,
    /// Messages younger than this are skipped; they may still be edited.
    pub min_age: Duration,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            blocked_keywords: [
                "advertiser",
                "sponsor",
                "sponsored",
                "promotion",
                "telegram premium",
                "reklam",
                "sponsorlu",
                "taksit",
                "indirim",
                "kampanya",
                // Domestic politics noise.
                "dem parti",
                "dem partisi",
                "özgür özel",
                "chp",
                "akp",
                "ımamoğlu",
                "imamoglu",
                // Channel self-references and cross-promo.
                "conflicttr",
                "ww3media",
                "ateobreaking",
                "dunyadantr",
                "dunyadan_tr",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            blocked_symbols: vec!['🎉', '🎁', '🎊', '🎈', '🎂', '🎇', '🎆', '🥳', '🎀', '🎟'],
            min_age: Duration::from_secs(300),
        }
    }
}

/// Content filter with compiled URL detection.
pub struct ContentFilter {
    policy: FilterPolicy,
    url_re: Regex,
}

impl ContentFilter {
    pub fn new(mut policy: FilterPolicy) -> Self {
        // Keywords are matched against lowercased text, so normalize the
        // operator-supplied list once here.
        for keyword in &mut policy.blocked_keywords {
            *keyword = keyword.to_lowercase();
        }
        Self {
            policy,
            // Compiles from a literal; cannot fail.
            url_re: Regex::new(r"https?://\S+").unwrap(),
        }
    }

    /// Evaluate a message against the cheap rules.
    ///
    /// Returns `Some(RejectReason)` on the first matching rule, `None` if
    /// the message survives. The duplicate checks (rule 5) live in the
    /// processor because they need the per-pass set and the store.
    pub fn evaluate(
        &self,
        message: &SourceMessage,
        allowed_senders: &[String],
    ) -> Option<RejectReason> {
        // Rule 1: allow-list. Empty list means discovery mode.
        if allowed_senders.is_empty() {
            info!(
                source = %message.source,
                sender = %message.sender_name,
                "Discovery mode: accepting unlisted sender"
            );
        } else if !allowed_senders.iter().any(|s| s == &message.sender_name) {
            debug!(
                source = %message.source,
                sender = %message.sender_name,
                "Sender not on allow-list"
            );
            return Some(RejectReason::SenderNotAllowed(message.sender_name.clone()));
        }

        // Rule 2: blocked keywords, case-insensitive substring.
        let lower = message.text.to_lowercase();
        for keyword in &self.policy.blocked_keywords {
            if lower.contains(keyword.as_str()) {
                debug!(source = %message.source, keyword = %keyword, "Blocked keyword");
                return Some(RejectReason::BlockedKeyword(keyword.clone()));
            }
        }

        // Rule 3: links and promo symbols.
        if self.url_re.is_match(&message.text)
            || message
                .text
                .chars()
                .any(|c| self.policy.blocked_symbols.contains(&c))
        {
            debug!(source = %message.source, "URL or blocked symbol");
            return Some(RejectReason::UrlOrBlockedSymbol);
        }

        // Rule 4: edit window.
        let age = Utc::now().signed_duration_since(message.sent_at);
        let min_age = self.policy.min_age.as_secs() as i64;
        if age.num_seconds() < min_age {
            debug!(
                source = %message.source,
                age_secs = age.num_seconds(),
                "Message too recent, may still be edited"
            );
            return Some(RejectReason::TooRecent {
                age_secs: age.num_seconds().max(0),
            });
        }

        None
    }

    /// Rule 5a: exact fingerprint already handled during this run.
    pub fn is_seen_this_run(&self, fingerprint: &str, seen: &HashSet<String>) -> bool {
        seen.contains(fingerprint)
    }
}
