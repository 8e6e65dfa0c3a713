//! Stack field tokenization.
//!
//! A `stack` value is free text such as `"React / Node, Go"`. Both `/` and `,`
//! are accepted as delimiters everywhere: cards, filters and the stack
//! catalog all go through [`tokenize`], so a record that matches a filter
//! always shows the matching chip.

use std::collections::BTreeSet;

const DELIMITERS: [char; 2] = ['/', ','];

fn segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Split a stack value into lower-case tokens, first-seen order, no
/// duplicates. Empty input yields an empty vec.
pub fn tokenize(raw: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    segments(raw)
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Same split as [`tokenize`] but keeps the original casing for display.
/// Duplicates are detected on the folded form; the first spelling wins.
pub fn display_tokens(raw: &str) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    segments(raw)
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Normalise a user-supplied token for comparison.
pub fn normalize_token(raw: &str) -> Option<String> {
    let t = raw.trim().to_lowercase();
    if t.is_empty() || t.contains(DELIMITERS) {
        None
    } else {
        Some(t)
    }
}

/// Exact token membership.
pub fn contains_token(raw: &str, token: &str) -> bool {
    let needle = token.trim().to_lowercase();
    !needle.is_empty() && segments(raw).any(|t| t.to_lowercase() == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed_delimiters() {
        assert_eq!(tokenize("React / Node, Go"), vec!["react", "node", "go"]);
    }

    #[test]
    fn test_tokenize_empty_and_blank() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" / /").is_empty());
        assert!(tokenize(",,").is_empty());
    }

    #[test]
    fn test_tokenize_dedupes_case_insensitively() {
        assert_eq!(tokenize("Go/go/ GO ,Rust"), vec!["go", "rust"]);
    }

    #[test]
    fn test_tokenize_is_idempotent() {
        let once = tokenize("Spring Boot / Oracle, JPA");
        let twice = tokenize(&once.join("/"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_display_tokens_keep_casing() {
        assert_eq!(display_tokens("React / react, Node"), vec!["React", "Node"]);
    }

    #[test]
    fn test_contains_token_is_exact() {
        assert!(contains_token("Golang / Go", "go"));
        assert!(!contains_token("Golang / Django", "go"));
        assert!(!contains_token("Go", ""));
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  Go "), Some("go".to_string()));
        assert_eq!(normalize_token("   "), None);
        assert_eq!(normalize_token("a/b"), None);
    }
}
