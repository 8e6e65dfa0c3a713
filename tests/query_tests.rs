//! Query composition and PostgREST rendering.

use portfolio_dashboard::model::{SortMode, Table};
use portfolio_dashboard::query::postgrest::{describe, prefer_header, to_postgrest};
use portfolio_dashboard::query::*;
use pretty_assertions::assert_eq;

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ═══════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_home_preview_of_works() {
    let q = build(Table::Works, &FilterState::new(), ListMode::Preview { limit: 9 }, 1);
    let params = to_postgrest(&q);
    assert_eq!(param(&params, "order"), Some("id.desc.nullslast"));
    assert_eq!(param(&params, "limit"), Some("9"));
    assert_eq!(param(&params, "offset"), None);
    assert_eq!(prefer_header(&q), None);
}

#[test]
fn test_second_page_window() {
    let q = build(Table::Works, &FilterState::new(), ListMode::Paged { page_size: 12 }, 2);
    let params = to_postgrest(&q);
    assert_eq!(param(&params, "offset"), Some("12"));
    assert_eq!(param(&params, "limit"), Some("12"));
    assert_eq!(prefer_header(&q), Some("count=exact"));
}

#[test]
fn test_combined_filters_render() {
    let f = FilterState::new()
        .search("api")
        .category("feature")
        .category("ops")
        .stack("GO")
        .sorted(SortMode::Title);
    let q = build(Table::Works, &f, ListMode::Unbounded, 1);
    let params = to_postgrest(&q);

    assert_eq!(
        param(&params, "or"),
        Some("(title.ilike.*api*,description.ilike.*api*)")
    );
    assert_eq!(param(&params, "category"), Some("in.(feature,ops)"));
    assert_eq!(param(&params, "stack"), Some("ilike.*go*"));
    assert_eq!(param(&params, "order"), Some("title.asc.nullslast"));
    assert_eq!(param(&params, "limit"), None);
}

#[test]
fn test_search_with_spaces_is_quoted() {
    let f = FilterState::new().search("rate limits");
    let q = build(Table::Works, &f, ListMode::Unbounded, 1);
    let params = to_postgrest(&q);
    assert_eq!(
        param(&params, "or"),
        Some("(title.ilike.\"*rate limits*\",description.ilike.\"*rate limits*\")")
    );
}

#[test]
fn test_projects_select_everything() {
    let q = build(Table::Projects, &FilterState::new(), ListMode::Unbounded, 1);
    assert_eq!(param(&to_postgrest(&q), "select"), Some("*"));
    assert!(describe(&q).starts_with("portfolio_projects?select=*"));
}

#[test]
fn test_timeline_query_shape() {
    let q = timeline_query(None);
    let params = to_postgrest(&q);
    assert_eq!(param(&params, "visibility"), Some("is.true"));
    assert_eq!(
        param(&params, "order"),
        Some("work_at.desc.nullslast,id.desc.nullslast")
    );
    assert_eq!(q.range, Range::All);

    assert_eq!(timeline_query(Some(4)).range, Range::Limit(4));
}

#[test]
fn test_stack_filter_keeps_exact_token_for_recheck() {
    let q = build(
        Table::Works,
        &FilterState::new().stack(" Rust "),
        ListMode::Paged { page_size: 12 },
        1,
    );
    assert_eq!(q.post_filter_token.as_deref(), Some("rust"));

    let none = build(Table::Works, &FilterState::new().stack("a/b"), ListMode::Unbounded, 1);
    assert!(none.filters.is_empty());
    assert_eq!(none.post_filter_token, None);
}

// ═══════════════════════════════════════════════════════════════════════════
// Pagination
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_page_param_parsing() {
    assert_eq!(parse_page_param(None), 1);
    assert_eq!(parse_page_param(Some("3")), 3);
    assert_eq!(parse_page_param(Some("0")), 1);
    assert_eq!(parse_page_param(Some("-2")), 1);
    assert_eq!(parse_page_param(Some("two")), 1);
}

#[test]
fn test_window_is_centered() {
    let w = page_window(5, 10, 5);
    assert_eq!(w.to_vec(), vec![3, 4, 5, 6, 7]);
    assert!(w.leading_ellipsis);
    assert!(w.trailing_ellipsis);
}

#[test]
fn test_window_smaller_than_width() {
    let w = page_window(2, 3, 5);
    assert_eq!(w.to_vec(), vec![1, 2, 3]);
    assert!(!w.leading_ellipsis);
    assert!(!w.trailing_ellipsis);
}

#[test]
fn test_pagination_navigation_flags() {
    let mut p = Pagination::new(12);
    p.total_count = 15;
    assert_eq!(p.total_pages(), 2);
    assert!(!p.has_prev());
    assert!(p.has_next());
    p.page = 2;
    assert_eq!(p.offset(), 12);
    assert!(p.has_prev());
    assert!(!p.has_next());
}
