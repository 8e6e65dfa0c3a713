//! Query composition: filter state in, [`QueryDescription`] out.

pub mod description;
pub mod pagination;
pub mod postgrest;

use std::collections::BTreeSet;

use crate::model::tokens::normalize_token;
use crate::model::{SortMode, Table};

pub use description::*;
pub use pagination::*;

// ---------------------------------------------------------------------------
// FilterState
// ---------------------------------------------------------------------------

/// User-editable list filters. Created empty when a list mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_text: String,
    pub categories: BTreeSet<String>,
    pub stack_token: Option<String>,
    pub sort: SortMode,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn stack(mut self, token: &str) -> Self {
        self.stack_token = normalize_token(token);
        self
    }

    pub fn sorted(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Trimmed search text, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        let t = self.search_text.trim();
        (!t.is_empty()).then_some(t)
    }

    /// Whether any narrowing filter (search, category, stack) is active.
    pub fn is_narrowed(&self) -> bool {
        self.search_term().is_some() || !self.categories.is_empty() || self.stack_token.is_some()
    }
}

// ---------------------------------------------------------------------------
// ListMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Fixed cap, no paging.
    Preview { limit: usize },
    /// Offset/count windows plus a total count.
    Paged { page_size: u32 },
    /// Every matching row.
    Unbounded,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Compose the store query for a list. Pure: nothing in `filter` changes.
///
/// `page` is only read in [`ListMode::Paged`] and is treated as at least 1.
pub fn build(table: Table, filter: &FilterState, mode: ListMode, page: u32) -> QueryDescription {
    let mut query = QueryDescription::new(table);
    if table == Table::Works {
        query = query.select(WORK_COLUMNS);
    }

    query = match filter.sort {
        SortMode::Title => query.order_by(OrderBy::asc(Column::Title)),
        SortMode::Recent => query.order_by(OrderBy::desc(Column::Id)),
    };

    if let Some(term) = filter.search_term() {
        query = query.filter(Predicate::AnyILike {
            columns: vec![Column::Title, Column::Description],
            pattern: contains_pattern(term),
        });
    }

    if !filter.categories.is_empty() {
        query = query.filter(Predicate::In {
            column: Column::Category,
            values: filter.categories.iter().cloned().collect(),
        });
    }

    if let Some(token) = &filter.stack_token {
        query = query.filter(Predicate::ILike {
            column: Column::Stack,
            pattern: contains_pattern(token),
        });
        query.post_filter_token = Some(token.clone());
    }

    match mode {
        ListMode::Preview { limit } => query.range(Range::Limit(limit)),
        ListMode::Paged { page_size } => {
            let size = page_size.max(1) as usize;
            let offset = (page.max(1) as usize - 1) * size;
            query
                .range(Range::Window {
                    offset,
                    count: size,
                })
                .with_count()
        }
        ListMode::Unbounded => query,
    }
}

/// Year timeline of visible work records: `work_at` newest first (missing
/// last), ties by id descending.
pub fn timeline_query(limit: Option<usize>) -> QueryDescription {
    let query = QueryDescription::new(Table::Works)
        .select(TIMELINE_COLUMNS)
        .filter(Predicate::IsTrue {
            column: Column::Visibility,
        })
        .order_by(OrderBy::desc(Column::WorkAt))
        .order_by(OrderBy::desc(Column::Id));
    match limit {
        Some(n) => query.range(Range::Limit(n)),
        None => query,
    }
}

/// Stack column of every works row, for the stack catalog.
pub fn stack_catalog_query() -> QueryDescription {
    QueryDescription::new(Table::Works).select(&[Column::Stack])
}
