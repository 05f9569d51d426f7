//! Campaign keyword handling.
//!
//! The campaign form posts keywords as one comma-separated string; the
//! API also accepts an array. Both end up as the same normalized list.

use std::collections::{BTreeSet, HashSet};

/// Split a comma-separated keyword string into a normalized list.
///
/// Entries are trimmed, empties dropped, and duplicates removed
/// case-insensitively (the first spelling wins). Order is preserved.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    normalize_keywords(raw.split(','))
}

/// Apply the same normalization rules as [`parse_keywords`] to an
/// already-split list.
pub fn normalize_keywords<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| {
            let collapsed = item
                .as_ref()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if collapsed.is_empty() || !seen.insert(collapsed.to_lowercase()) {
                None
            } else {
                Some(collapsed)
            }
        })
        .collect()
}

/// Lowercase word tokens of a free-text field.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_string() {
        assert_eq!(
            parse_keywords(" startups, AI ,, leadership "),
            vec!["startups", "AI", "leadership"]
        );
    }

    #[test]
    fn dedupes_case_insensitively_keeping_first_spelling() {
        assert_eq!(
            parse_keywords("SaaS, saas, Growth,growth , SAAS"),
            vec!["SaaS", "Growth"]
        );
    }

    #[test]
    fn collapses_inner_whitespace() {
        assert_eq!(
            normalize_keywords(["  product   management ", "Product Management"]),
            vec!["product management"]
        );
    }

    #[test]
    fn empty_input_yields_empty_list() {
        assert!(parse_keywords("").is_empty());
        assert!(parse_keywords(" , ,").is_empty());
    }

    #[test]
    fn tokenize_splits_on_punctuation() {
        let tokens = tokenize("The Growth-Hacking Show: B2B!");
        assert!(tokens.contains("growth"));
        assert!(tokens.contains("hacking"));
        assert!(tokens.contains("b2b"));
        assert!(!tokens.contains(""));
    }
}
