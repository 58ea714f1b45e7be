//! Keyword extraction for similarity scoring.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::link_parser::strip_html;

/// Whitespace plus ASCII and CJK sentence punctuation.
static SPLIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s、。，．！？!?,.:;]+").expect("keyword split regex"));

/// English words too common to say anything about a note.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "in", "on", "at", "to",
    "for", "of", "with", "by", "from", "as", "this", "that", "these", "those", "it", "its", "be",
    "been", "have", "has",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOPWORDS.iter().copied().collect());

/// Normalize `text` into a deduplicated list of lowercase keywords.
///
/// Markup is stripped first. Tokens of one character or fewer and stopwords
/// are dropped. Order of first appearance is kept, though callers should
/// treat the result as a set.
///
/// # Examples
///
/// ```
/// use notegraph_core::extract_keywords;
///
/// assert_eq!(extract_keywords("The Rust book, the RUST way."), vec!["rust", "book", "way"]);
/// ```
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = strip_html(text).to_lowercase();
    let mut seen = HashSet::new();

    SPLIT_REGEX
        .split(&lowered)
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !STOPWORD_SET.contains(*token))
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_dedups() {
        let keywords = extract_keywords("Rust rust RUST Tokio");
        assert_eq!(keywords, vec!["rust", "tokio"]);
    }

    #[test]
    fn test_drops_stopwords() {
        let keywords = extract_keywords("This is the state of the art and it has been done");
        assert_eq!(keywords, vec!["state", "art", "done"]);
    }

    #[test]
    fn test_drops_single_character_tokens() {
        let keywords = extract_keywords("x y z ok");
        assert_eq!(keywords, vec!["ok"]);
    }

    #[test]
    fn test_strips_markup() {
        let keywords = extract_keywords("<p>Graph</p><strong>theory</strong>");
        assert_eq!(keywords, vec!["graph", "theory"]);
    }

    #[test]
    fn test_splits_on_punctuation() {
        let keywords = extract_keywords("alpha,beta;gamma:delta!epsilon?zeta.eta");
        assert_eq!(
            keywords,
            vec!["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta"]
        );
    }

    #[test]
    fn test_splits_on_cjk_punctuation() {
        let keywords = extract_keywords("東京、大阪。京都！");
        assert_eq!(keywords, vec!["東京", "大阪", "京都"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   ").is_empty());
        assert!(extract_keywords("<br/>").is_empty());
    }

    #[test]
    fn test_stopword_list_is_lowercase() {
        assert_eq!(STOPWORDS.len(), 30);
        assert!(STOPWORDS.iter().all(|w| w.chars().all(|c| c.is_ascii_lowercase())));
    }
}
