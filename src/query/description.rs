//! Declarative query description handed to a [`RecordStore`](crate::store::RecordStore).

use std::fmt;

use crate::model::Table;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Title,
    Description,
    Category,
    Stack,
    Impact,
    WorkAt,
    WorkPeriod,
    CreatedAt,
    Visibility,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::Category => "category",
            Self::Stack => "stack",
            Self::Impact => "impact",
            Self::WorkAt => "work_at",
            Self::WorkPeriod => "work_period",
            Self::CreatedAt => "created_at",
            Self::Visibility => "visibility",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns requested by list views of the works table.
pub const WORK_COLUMNS: &[Column] = &[
    Column::Id,
    Column::Title,
    Column::Description,
    Column::Category,
    Column::Stack,
    Column::Impact,
    Column::WorkAt,
    Column::CreatedAt,
];

/// Columns requested by the year timeline.
pub const TIMELINE_COLUMNS: &[Column] = &[
    Column::Id,
    Column::Title,
    Column::Description,
    Column::Category,
    Column::Stack,
    Column::Impact,
    Column::WorkAt,
    Column::WorkPeriod,
    Column::Visibility,
    Column::CreatedAt,
];

// ---------------------------------------------------------------------------
// Predicates / ordering / range
// ---------------------------------------------------------------------------

/// A server-side filter. All predicates in a query are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive LIKE on any of the columns (OR-combined).
    AnyILike { columns: Vec<Column>, pattern: String },
    /// Case-insensitive LIKE on one column.
    ILike { column: Column, pattern: String },
    /// Column value is one of `values`.
    In { column: Column, values: Vec<String> },
    /// Column holds a truthy flag.
    IsTrue { column: Column },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub direction: Direction,
    /// Rows with a missing value sort after all others.
    pub nulls_last: bool,
}

impl OrderBy {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Asc,
            nulls_last: true,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Desc,
            nulls_last: true,
        }
    }
}

/// How many rows to return. `Limit` and `Window` are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Range {
    #[default]
    All,
    /// Hard cap, no offset (preview lists).
    Limit(usize),
    /// `count` rows starting at `offset` (paged lists).
    Window { offset: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    #[default]
    None,
    Exact,
}

// ---------------------------------------------------------------------------
// QueryDescription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescription {
    pub table: Table,
    /// Requested columns; empty means all.
    pub columns: Vec<Column>,
    pub filters: Vec<Predicate>,
    pub order: Vec<OrderBy>,
    pub range: Range,
    pub count: CountMode,
    /// Exact stack token every returned record must carry. Applied by the
    /// list controller after the fetch; the `stack` ILIKE predicate is only
    /// a prefilter.
    pub post_filter_token: Option<String>,
}

impl QueryDescription {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            range: Range::All,
            count: CountMode::None,
            post_filter_token: None,
        }
    }

    pub fn select(mut self, columns: &[Column]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = CountMode::Exact;
        self
    }

    /// Head-only variant: same predicates, no ordering, no range, no rows.
    pub fn count_query(&self) -> Self {
        Self {
            table: self.table,
            columns: vec![Column::Id],
            filters: self.filters.clone(),
            order: Vec::new(),
            range: Range::All,
            count: CountMode::Exact,
            post_filter_token: None,
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self.range, Range::Window { .. })
    }
}

/// Escape LIKE metacharacters in user text.
pub fn like_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `%text%` with `text` escaped.
pub fn contains_pattern(raw: &str) -> String {
    format!("%{}%", like_escape(raw))
}
