//! Article-number fuzzy matching.
//!
//! Customer-specific prefixes and drawing-number revisions make external
//! article numbers drift from what is stored locally:
//!
//! - `byn-10101251` normalizes to `10101251` (prefix stripped)
//! - `90057637-00` has base `90057637` and revision `00`
//!
//! Match priority: exact, then prefix-stripped, then revision-ignored, then
//! fuzzy (bases agree). Everything except an exact match carries a warning.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Known customer prefixes. Extend as new customers appear.
const CUSTOMER_PREFIXES: [&str; 3] = ["byn-", "trgcz-", "gelso-"];

/// Revision suffix at the end of the string: `-00`, `-01`, `-A`, `-B`, ...
fn revision_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-([0-9]{2}|[A-Z])$").unwrap())
}

/// Article number decomposed into prefix, base and revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticleNumber {
    /// Original input, e.g. `byn-10101251`.
    pub original: String,
    /// Without the customer prefix, e.g. `10101251`.
    pub normalized: String,
    /// Without prefix and revision, e.g. `90057637`.
    pub base: String,
    pub prefix: Option<String>,
    pub revision: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    PrefixStripped,
    RevisionIgnored,
    Fuzzy,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::PrefixStripped => "prefix_stripped",
            MatchType::RevisionIgnored => "revision_ignored",
            MatchType::Fuzzy => "fuzzy",
        }
    }
}

/// Extracts customer prefix and revision suffix.
pub fn normalize(article_number: &str) -> NormalizedArticleNumber {
    let original = article_number.trim().to_string();
    let mut prefix = None;
    let mut normalized = original.clone();

    for known_prefix in CUSTOMER_PREFIXES {
        if original.to_lowercase().starts_with(known_prefix) {
            prefix = Some(original[..known_prefix.len()].to_string());
            normalized = original[known_prefix.len()..].to_string();
            break;
        }
    }

    let (base, revision) = match revision_pattern().captures(&normalized) {
        Some(captures) => {
            let whole = captures.get(0).unwrap();
            (
                normalized[..whole.start()].to_string(),
                Some(captures.get(1).unwrap().as_str().to_string()),
            )
        }
        None => (normalized.clone(), None),
    };

    NormalizedArticleNumber {
        original,
        normalized,
        base,
        prefix,
        revision,
    }
}

/// Search variants in priority order: exact, without prefix, without prefix
/// and revision. Deduplicated, order preserved.
pub fn generate_variants(article_number: &str) -> Vec<String> {
    let norm = normalize(article_number);
    let mut variants = Vec::with_capacity(3);
    for candidate in [norm.original, norm.normalized, norm.base] {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Classifies how an input article number relates to a stored one and builds
/// the warning shown to the operator for anything weaker than exact.
pub fn match_type(input_article: &str, stored_article: &str) -> (MatchType, Option<String>) {
    if input_article == stored_article {
        return (MatchType::Exact, None);
    }

    let input = normalize(input_article);
    let stored = normalize(stored_article);

    if input.normalized == stored.normalized && input.prefix != stored.prefix {
        let warning = format!(
            "Prefix mismatch: '{input_article}' matched to '{stored_article}' \
             (customer prefix differs)"
        );
        return (MatchType::PrefixStripped, Some(warning));
    }

    if input.base == stored.base && input.revision != stored.revision {
        let warning = format!(
            "Revision mismatch: '{input_article}' (rev {}) matched to '{stored_article}' (rev {})",
            input.revision.as_deref().unwrap_or("none"),
            stored.revision.as_deref().unwrap_or("none"),
        );
        return (MatchType::RevisionIgnored, Some(warning));
    }

    let warning = format!(
        "Fuzzy match: '{input_article}' matched to '{stored_article}' \
         (normalized: {} ~ {})",
        input.base, stored.base
    );
    (MatchType::Fuzzy, Some(warning))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_number() {
        let norm = normalize("10101251");
        assert_eq!(norm.normalized, "10101251");
        assert_eq!(norm.base, "10101251");
        assert!(norm.prefix.is_none());
        assert!(norm.revision.is_none());
    }

    #[test]
    fn test_normalize_customer_prefix() {
        let norm = normalize("byn-10101251");
        assert_eq!(norm.prefix.as_deref(), Some("byn-"));
        assert_eq!(norm.normalized, "10101251");
        assert_eq!(norm.base, "10101251");
    }

    #[test]
    fn test_normalize_revision_suffix() {
        let norm = normalize("90057637-00");
        assert_eq!(norm.base, "90057637");
        assert_eq!(norm.revision.as_deref(), Some("00"));

        let norm = normalize("90057637-A");
        assert_eq!(norm.base, "90057637");
        assert_eq!(norm.revision.as_deref(), Some("A"));
    }

    #[test]
    fn test_normalize_prefix_and_revision() {
        let norm = normalize("trgcz-123456-01");
        assert_eq!(norm.prefix.as_deref(), Some("trgcz-"));
        assert_eq!(norm.normalized, "123456-01");
        assert_eq!(norm.base, "123456");
        assert_eq!(norm.revision.as_deref(), Some("01"));
    }

    #[test]
    fn test_single_digit_suffix_is_not_a_revision() {
        let norm = normalize("F4-8");
        assert_eq!(norm.base, "F4-8");
        assert!(norm.revision.is_none());
    }

    #[test]
    fn test_variants_ordered_and_deduplicated() {
        assert_eq!(
            generate_variants("byn-10101251"),
            vec!["byn-10101251".to_string(), "10101251".to_string()]
        );
        assert_eq!(
            generate_variants("trgcz-123456-01"),
            vec![
                "trgcz-123456-01".to_string(),
                "123456-01".to_string(),
                "123456".to_string()
            ]
        );
        assert_eq!(generate_variants("90057637"), vec!["90057637".to_string()]);
    }

    #[test]
    fn test_match_type_exact() {
        let (match_type, warning) = match_type("10101251", "10101251");
        assert_eq!(match_type, MatchType::Exact);
        assert!(warning.is_none());
    }

    #[test]
    fn test_match_type_prefix_stripped() {
        let (match_type, warning) = match_type("byn-10101251", "10101251");
        assert_eq!(match_type, MatchType::PrefixStripped);
        assert!(warning.unwrap().contains("Prefix mismatch"));
    }

    #[test]
    fn test_match_type_revision_ignored() {
        let (match_type, warning) = match_type("90057637-00", "90057637-01");
        assert_eq!(match_type, MatchType::RevisionIgnored);
        assert!(warning.unwrap().contains("Revision mismatch"));
    }
}
