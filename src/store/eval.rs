//! In-memory evaluation of a [`QueryDescription`].
//!
//! Mirrors what a PostgREST-backed store does server-side: LIKE matching is
//! case-insensitive, predicates are AND-combined, missing values sort last,
//! and the count ignores the range.

use std::cmp::Ordering;

use crate::model::Record;
use crate::query::{Column, CountMode, Direction, OrderBy, Predicate, QueryDescription, Range};

use super::StorePage;

/// Filter, order, count and slice `rows` as `query` asks.
pub fn evaluate(rows: Vec<Record>, query: &QueryDescription) -> StorePage {
    let mut rows: Vec<Record> = rows
        .into_iter()
        .filter(|r| query.filters.iter().all(|p| matches_predicate(r, p)))
        .collect();

    if !query.order.is_empty() {
        rows.sort_by(|a, b| compare_rows(a, b, &query.order));
    }

    let total_count = match query.count {
        CountMode::Exact => Some(rows.len() as u64),
        CountMode::None => None,
    };

    let records = match query.range {
        Range::All => rows,
        Range::Limit(n) => rows.into_iter().take(n).collect(),
        Range::Window { offset, count } => rows.into_iter().skip(offset).take(count).collect(),
    };

    StorePage {
        records,
        total_count,
    }
}

/// Number of rows matching the predicates of `query`.
pub fn count(rows: &[Record], query: &QueryDescription) -> u64 {
    rows.iter()
        .filter(|r| query.filters.iter().all(|p| matches_predicate(r, p)))
        .count() as u64
}

pub fn matches_predicate(record: &Record, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::AnyILike { columns, pattern } => columns
            .iter()
            .any(|c| text_of(record, *c).is_some_and(|v| ilike(&v, pattern))),
        Predicate::ILike { column, pattern } => {
            text_of(record, *column).is_some_and(|v| ilike(&v, pattern))
        }
        Predicate::In { column, values } => {
            text_of(record, *column).is_some_and(|v| values.iter().any(|x| *x == v))
        }
        Predicate::IsTrue { column } => match column {
            Column::Visibility => record.is_visible(),
            other => text_of(record, *other).is_some_and(|v| v.eq_ignore_ascii_case("true")),
        },
    }
}

fn text_of(record: &Record, column: Column) -> Option<String> {
    match column {
        Column::Id => Some(record.id.to_string()),
        Column::Impact => Some(record.impact.to_string()),
        other => record.text(other.name()).map(str::to_string),
    }
}

fn compare_rows(a: &Record, b: &Record, order: &[OrderBy]) -> Ordering {
    order
        .iter()
        .map(|o| compare_column(a, b, o))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn compare_column(a: &Record, b: &Record, order: &OrderBy) -> Ordering {
    let directed = |ord: Ordering| match order.direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    };

    match order.column {
        Column::Id => directed(a.id.cmp(&b.id)),
        Column::Impact => directed(a.impact.cmp(&b.impact)),
        column => {
            let av = non_empty(record_text(a, column));
            let bv = non_empty(record_text(b, column));
            match (av, bv) {
                (Some(x), Some(y)) => directed(x.to_lowercase().cmp(&y.to_lowercase())),
                (Some(_), None) if order.nulls_last => Ordering::Less,
                (None, Some(_)) if order.nulls_last => Ordering::Greater,
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            }
        }
    }
}

fn record_text(record: &Record, column: Column) -> Option<&str> {
    record.text(column.name())
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.trim().is_empty())
}

/// Case-insensitive SQL LIKE: `%` any run, `_` one char, `\` escapes.
pub fn ilike(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.to_lowercase().chars().collect();
    let pattern = compile(&pattern.to_lowercase());
    like_match(&value, &pattern)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Any,
    One,
    Lit(char),
}

fn compile(pattern: &str) -> Vec<Tok> {
    let mut out = Vec::new();
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push(Tok::Lit(chars.next().unwrap_or('\\'))),
            '%' => out.push(Tok::Any),
            '_' => out.push(Tok::One),
            c => out.push(Tok::Lit(c)),
        }
    }
    out
}

/// Iterative wildcard match with single-star backtracking.
fn like_match(value: &[char], pattern: &[Tok]) -> bool {
    let (mut v, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some(Tok::Any) => {
                star = Some((p, v));
                p += 1;
            }
            Some(Tok::One) => {
                v += 1;
                p += 1;
            }
            Some(Tok::Lit(c)) if *c == value[v] => {
                v += 1;
                p += 1;
            }
            _ => match star {
                Some((sp, sv)) => {
                    p = sp + 1;
                    v = sv + 1;
                    star = Some((sp, sv + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|t| *t == Tok::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;

    #[test]
    fn test_ilike() {
        assert!(ilike("Payment API rewrite", "%api%"));
        assert!(ilike("API", "api"));
        assert!(!ilike("rapid", "api"));
        assert!(ilike("go", "%go%"));
        assert!(ilike("a_b", "a\\_b"));
        assert!(!ilike("axb", "a\\_b"));
        assert!(ilike("axb", "a_b"));
        assert!(ilike("100% done", "%100\\%%"));
        assert!(!ilike("100 done", "%100\\%%"));
    }

    #[test]
    fn test_nulls_sort_last_in_both_directions() {
        let mut a = Record::new(1, "a");
        a.work_at = Some("2020-01".into());
        let b = Record::new(2, "b");
        let mut c = Record::new(3, "c");
        c.work_at = Some("2023-01".into());

        let q = QueryDescription::new(Table::Works).order_by(OrderBy::desc(Column::WorkAt));
        let ids: Vec<i64> = evaluate(vec![a.clone(), b.clone(), c.clone()], &q)
            .records
            .iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);

        let q = QueryDescription::new(Table::Works).order_by(OrderBy::asc(Column::WorkAt));
        let ids: Vec<i64> = evaluate(vec![a, b, c], &q)
            .records
            .iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_window_and_count() {
        let rows: Vec<Record> = (1..=25).map(|i| Record::new(i, format!("r{i}"))).collect();
        let q = QueryDescription::new(Table::Works)
            .order_by(OrderBy::desc(Column::Id))
            .range(Range::Window {
                offset: 24,
                count: 12,
            })
            .with_count();
        let page = evaluate(rows, &q);
        assert_eq!(page.total_count, Some(25));
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id.get(), 1);
    }
}
