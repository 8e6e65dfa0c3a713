//! Stack tokens, categories, derived card values and lenient decoding.

use portfolio_dashboard::model::tokens::{contains_token, normalize_token};
use portfolio_dashboard::model::*;
use pretty_assertions::assert_eq;

// ═══════════════════════════════════════════════════════════════════════════
// Stack tokens
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_tokenize_trims_folds_and_dedupes() {
    assert_eq!(tokenize(" Go / PostgreSQL , go "), vec!["go", "postgresql"]);
    assert_eq!(tokenize("React/Node/GraphQL"), vec!["react", "node", "graphql"]);
}

#[test]
fn test_tokenize_empty_and_delimiter_only() {
    assert!(tokenize("").is_empty());
    assert!(tokenize(" / , /").is_empty());
}

#[test]
fn test_display_tokens_keep_first_spelling() {
    assert_eq!(display_tokens("Go, GO / Rust"), vec!["Go", "Rust"]);
}

#[test]
fn test_exact_token_is_not_substring() {
    assert!(contains_token("Django/Python", "python"));
    assert!(!contains_token("Django/Python", "go"));
    assert!(!contains_token("Golang", "go"));
    assert!(!contains_token("Go", ""));
}

#[test]
fn test_normalize_token_rejects_delimiters() {
    assert_eq!(normalize_token(" Rust "), Some("rust".to_string()));
    assert_eq!(normalize_token("a/b"), None);
    assert_eq!(normalize_token("   "), None);
}

// ═══════════════════════════════════════════════════════════════════════════
// Categories
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_category_style_keys() {
    let keys: Vec<&str> = Category::ALL.iter().map(|c| c.style_key()).collect();
    assert_eq!(
        keys,
        vec!["k-red", "k-amber", "k-cyan", "k-violet", "k-emerald", "k-blue"]
    );
}

#[test]
fn test_unknown_category_gets_default_style() {
    for raw in ["", "chore", "FEATURE?", "  "] {
        let c = Category::from_str_loose(raw);
        assert_eq!(c, Category::Other, "{raw:?}");
        assert_eq!(c.style_key(), "k-gray");
    }
    assert_eq!(Category::from_str_loose(" Feature "), Category::Feature);
    assert_eq!(Record::new(1, "x").category_kind(), Category::Other);
}

#[test]
fn test_sort_mode_toggles() {
    assert_eq!(SortMode::Recent.next(), SortMode::Title);
    assert_eq!(SortMode::Title.next(), SortMode::Recent);
    assert_eq!(SortMode::from_str_loose("title"), SortMode::Title);
    assert_eq!(SortMode::from_str_loose("whatever"), SortMode::Recent);
}

// ═══════════════════════════════════════════════════════════════════════════
// Derived values
// ═══════════════════════════════════════════════════════════════════════════

fn record(json: &str) -> Record {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_year_resolution_order() {
    assert_eq!(resolve_year(Some("2022-05-01"), None, 2000), 2022);
    assert_eq!(resolve_year(Some("Mar 03, 2019"), None, 2000), 2019);
    assert_eq!(resolve_year(None, Some("2018-01-01T00:00:00Z"), 2000), 2018);
    assert_eq!(resolve_year(Some("soon"), Some("nope"), 2000), 2000);
}

#[test]
fn test_card_year_dash_without_work_at() {
    let r = record(r#"{"id": 1, "created_at": "2020-01-01T00:00:00Z"}"#);
    assert_eq!(r.card_year(), "—");
    assert_eq!(r.year(), 2020);
}

#[test]
fn test_impact_label_groups_thousands() {
    let mut r = Record::new(1, "x");
    r.impact = 1_234_567;
    assert_eq!(r.impact_label(), "1,234,567");
    r.impact = 999;
    assert_eq!(r.impact_label(), "999");
}

#[test]
fn test_malformed_fields_fall_back() {
    let r = record(
        r#"{"id": 7, "title": 42, "stack": null, "impact": -3, "category": 5, "work_at": ""}"#,
    );
    assert_eq!(r.title, "42");
    assert!(r.stack_tokens().is_empty());
    assert_eq!(r.impact, 0);
    assert_eq!(r.category_kind(), Category::Other);
    assert_eq!(r.card_year(), "—");
}

#[test]
fn test_impact_from_text() {
    assert_eq!(record(r#"{"id": 1, "impact": " 340 "}"#).impact, 340);
    assert_eq!(record(r#"{"id": 1, "impact": "n/a"}"#).impact, 0);
    assert_eq!(record(r#"{"id": 1, "impact": 12.9}"#).impact, 12);
}

#[test]
fn test_visibility_spellings() {
    for (raw, visible) in [
        ("true", true),
        ("\"Y\"", true),
        ("1", true),
        ("\"1\"", true),
        ("false", false),
        ("\"N\"", false),
        ("0", false),
        ("null", false),
    ] {
        let r = record(&format!(r#"{{"id": 1, "visibility": {raw}}}"#));
        assert_eq!(r.is_visible(), visible, "visibility {raw}");
    }
}

#[test]
fn test_unknown_columns_are_kept() {
    let r = record(r#"{"id": 3, "title": "t", "skills": "x", "image_url": "a.png"}"#);
    assert_eq!(r.image_path.as_deref(), Some("a.png"));
    assert_eq!(r.text("skills"), Some("x"));
}

// ═══════════════════════════════════════════════════════════════════════════
// Stack catalog
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_catalog_collects_every_token_sorted() {
    let mut a = Record::new(1, "a");
    a.stack = Some("Go/Rust".into());
    let mut b = Record::new(2, "b");
    b.stack = Some("rust, Kafka".into());
    let c = Record::new(3, "c");

    let catalog = StackCatalog::from_records([&a, &b, &c]);
    assert_eq!(catalog.tokens().collect::<Vec<_>>(), vec!["go", "kafka", "rust"]);
    assert_eq!(StackCatalog::label("kafka"), "KAFKA");
}

#[test]
fn test_catalog_cycle_wraps_to_none() {
    let mut a = Record::new(1, "a");
    a.stack = Some("b/a".into());
    let catalog = StackCatalog::from_records([&a]);
    assert_eq!(catalog.cycle(None).as_deref(), Some("a"));
    assert_eq!(catalog.cycle(Some("a")).as_deref(), Some("b"));
    assert_eq!(catalog.cycle(Some("b")), None);
}
