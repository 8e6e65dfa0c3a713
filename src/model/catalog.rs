//! Every stack token across a table, for the filter selector.

use std::collections::BTreeSet;

use super::record::Record;
use super::tokens::tokenize;

/// Distinct stack tokens, sorted. Stored folded; shown upper-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackCatalog {
    tokens: BTreeSet<String>,
}

impl StackCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let tokens = records
            .into_iter()
            .filter_map(|r| r.stack.as_deref())
            .flat_map(tokenize)
            .collect();
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Folded tokens in sorted order, as used in filters.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Display label for a token.
    pub fn label(token: &str) -> String {
        token.to_uppercase()
    }

    /// Token after `current` in sorted order, wrapping to "no token".
    pub fn cycle(&self, current: Option<&str>) -> Option<String> {
        match current {
            None => self.tokens.iter().next().cloned(),
            Some(cur) => self
                .tokens
                .iter()
                .find(|t| t.as_str() > cur)
                .cloned(),
        }
    }
}
