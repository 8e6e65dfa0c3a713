//! Render a [`QueryDescription`] as PostgREST query-string parameters.
//!
//! This is the wire form a hosted table store (Supabase and friends) takes.
//! `*` stands in for `%` because `%` would need URL escaping.

use super::description::{CountMode, Direction, Predicate, QueryDescription, Range};

/// Query-string pairs in a stable order: select, filters, order, paging.
pub fn to_postgrest(query: &QueryDescription) -> Vec<(String, String)> {
    let mut params = Vec::new();

    let select = if query.columns.is_empty() {
        "*".to_string()
    } else {
        query
            .columns
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(",")
    };
    params.push(("select".to_string(), select));

    for predicate in &query.filters {
        params.push(render_predicate(predicate));
    }

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| {
                let dir = match o.direction {
                    Direction::Asc => "asc",
                    Direction::Desc => "desc",
                };
                if o.nulls_last {
                    format!("{}.{dir}.nullslast", o.column)
                } else {
                    format!("{}.{dir}", o.column)
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }

    match query.range {
        Range::All => {}
        Range::Limit(n) => params.push(("limit".to_string(), n.to_string())),
        Range::Window { offset, count } => {
            params.push(("offset".to_string(), offset.to_string()));
            params.push(("limit".to_string(), count.to_string()));
        }
    }

    params
}

/// `Prefer` header value, when the query wants a count.
pub fn prefer_header(query: &QueryDescription) -> Option<&'static str> {
    match query.count {
        CountMode::Exact => Some("count=exact"),
        CountMode::None => None,
    }
}

/// `table?k=v&k=v` for logs and `--explain`. Values are not URL-encoded.
pub fn describe(query: &QueryDescription) -> String {
    let qs = to_postgrest(query)
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{qs}", query.table.name())
}

fn render_predicate(predicate: &Predicate) -> (String, String) {
    match predicate {
        Predicate::AnyILike { columns, pattern } => {
            let value = quote(&wildcard(pattern));
            let parts = columns
                .iter()
                .map(|c| format!("{c}.ilike.{value}"))
                .collect::<Vec<_>>()
                .join(",");
            ("or".to_string(), format!("({parts})"))
        }
        Predicate::ILike { column, pattern } => {
            (column.name().to_string(), format!("ilike.{}", wildcard(pattern)))
        }
        Predicate::In { column, values } => {
            let list = values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",");
            (column.name().to_string(), format!("in.({list})"))
        }
        Predicate::IsTrue { column } => (column.name().to_string(), "is.true".to_string()),
    }
}

/// LIKE pattern with unescaped `%` turned into `*`.
fn wildcard(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    for ch in pattern.chars() {
        match ch {
            '%' if !escaped => out.push('*'),
            '\\' if !escaped => {
                escaped = true;
                out.push(ch);
                continue;
            }
            _ => out.push(ch),
        }
        escaped = false;
    }
    out
}

/// Double-quote values that would break PostgREST's list syntax.
fn quote(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ':']) || value.contains(' ') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
