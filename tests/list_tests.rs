//! List controller driven against real stores: the bundled data directory,
//! an empty directory, and in-memory tables.

use std::path::PathBuf;

use portfolio_dashboard::list::{self, ApplyOutcome, FetchPayload, ListController, ListState};
use portfolio_dashboard::model::{Record, SortMode, StackCatalog, Table};
use portfolio_dashboard::query::{self, ListMode};
use portfolio_dashboard::scrollspy::{group_by_year, layout_sections, ScrollSpy, SpyOffsets};
use portfolio_dashboard::store::{FileStore, MemoryStore, RecordStore};
use pretty_assertions::assert_eq;

fn data_store() -> FileStore {
    FileStore::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"))
}

fn ids(list: &ListController) -> Vec<i64> {
    list.records().iter().map(|r| r.id.get()).collect()
}

/// Issue the pending request and land it.
async fn settle(list: &mut ListController, store: &dyn RecordStore) -> ApplyOutcome {
    let ticket = list.request();
    let result = list::execute(store, &ticket).await;
    list.complete(ticket.seq, result)
}

// ═══════════════════════════════════════════════════════════════════════════
// Paging
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_works_first_and_second_page() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 12 });

    assert_eq!(settle(&mut list, &store).await, ApplyOutcome::Applied);
    assert_eq!(list.state(), ListState::Ready);
    assert_eq!(list.total_count(), 15);
    assert_eq!(list.pagination().total_pages(), 2);
    assert_eq!(ids(&list), vec![15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4]);

    assert!(list.set_page(2));
    assert_eq!(settle(&mut list, &store).await, ApplyOutcome::Applied);
    assert_eq!(ids(&list), vec![3, 2, 1]);
    assert!(!list.set_page(7), "clamped to the last page, already there");
}

#[tokio::test]
async fn test_page_past_the_end_is_reclamped() {
    let store = data_store();
    let mut list =
        ListController::new(Table::Works, ListMode::Paged { page_size: 12 }).with_initial_page(5);

    assert_eq!(
        settle(&mut list, &store).await,
        ApplyOutcome::Reclamped { page: 2 }
    );
    assert_eq!(list.page(), 2);
    assert!(list.needs_fetch());

    assert_eq!(settle(&mut list, &store).await, ApplyOutcome::Applied);
    assert_eq!(ids(&list), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_projects_sorted_by_title() {
    let store = data_store();
    let mut list = ListController::new(Table::Projects, ListMode::Paged { page_size: 12 });
    list.set_sort(SortMode::Title);

    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![4, 2, 5, 1, 3]);
    assert_eq!(list.pagination().total_pages(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Filters
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_search_matches_title_or_description() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 12 });
    list.set_search("  API ");

    settle(&mut list, &store).await;
    // id 5 matches on its description only
    assert_eq!(ids(&list), vec![14, 7, 5, 1]);
    assert_eq!(list.total_count(), 4);
}

#[tokio::test]
async fn test_category_filter() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Unbounded);
    list.toggle_category("feature");

    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![12, 9, 7, 3]);

    list.toggle_category("ops");
    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![13, 12, 9, 7, 5, 3]);
}

#[tokio::test]
async fn test_stack_filter_is_exact_token() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Unbounded);
    list.set_stack_token(Some("Go"));

    settle(&mut list, &store).await;
    // "Django" and "Golang" pass the substring prefilter but are dropped
    assert_eq!(ids(&list), vec![14, 11, 9, 7, 1]);
    assert_eq!(list.total_count(), 5);
}

#[tokio::test]
async fn test_paged_stack_count_comes_from_the_prefilter() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 12 });
    list.set_stack_token(Some("go"));

    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![14, 11, 9, 7, 1]);
    assert_eq!(list.total_count(), 7);
}

#[tokio::test]
async fn test_filters_combine() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Unbounded);
    list.set_search("api");
    list.toggle_category("feature");
    list.set_stack_token(Some("redis"));

    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![7]);

    assert!(list.reset_filters());
    settle(&mut list, &store).await;
    assert_eq!(list.records().len(), 15);
}

// ═══════════════════════════════════════════════════════════════════════════
// Sequencing and failures
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Unbounded);

    let first = list.request();
    list.set_search("kafka");
    let second = list.request();

    // the newer request lands first, then the old one shows up late
    let newer = list::execute(&store, &second).await;
    assert_eq!(list.complete(second.seq, newer), ApplyOutcome::Applied);
    let older = list::execute(&store, &first).await;
    assert_eq!(list.complete(first.seq, older), ApplyOutcome::Discarded);

    assert_eq!(ids(&list), vec![11]);
}

#[tokio::test]
async fn test_remount_keeps_old_responses_stale() {
    let store = data_store();
    let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 12 });
    let before = list.request();

    list.remount(1);
    assert_eq!(list.state(), ListState::Idle);
    let after = list.request();
    assert!(after.seq > before.seq);

    let result = list::execute(&store, &before).await;
    assert_eq!(list.complete(before.seq, result), ApplyOutcome::Discarded);
    assert_eq!(list.state(), ListState::Loading { seq: after.seq });
}

#[tokio::test]
async fn test_missing_table_fails_soft() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 12 });

    let ticket = list.request();
    let result = list::execute(&store, &ticket).await;
    assert!(result.is_err());
    assert_eq!(list.complete(ticket.seq, result), ApplyOutcome::Applied);

    assert_eq!(list.state(), ListState::Failed);
    assert!(list.records().is_empty());
    assert_eq!(list.total_count(), 0);
    assert_eq!(list.pagination().total_pages(), 1);
}

#[tokio::test]
async fn test_malformed_file_fails_soft() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("portfolio_works.json"), "{not json").unwrap();
    let store = FileStore::new(dir.path());
    let mut list = ListController::new(Table::Works, ListMode::Unbounded);

    settle(&mut list, &store).await;
    assert_eq!(list.state(), ListState::Failed);
    assert!(list.records().is_empty());
}

#[tokio::test]
async fn test_bad_rows_do_not_hide_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("portfolio_works.json"),
        r#"[
            {"id": 1, "title": "Ledger", "work_at": "2021-01-01"},
            {"title": "no id"},
            42,
            {"id": "3", "title": "Search", "work_at": "2023-01-01"}
        ]"#,
    )
    .unwrap();
    let store = FileStore::new(dir.path());
    let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 12 });

    assert_eq!(settle(&mut list, &store).await, ApplyOutcome::Applied);
    assert_eq!(list.state(), ListState::Ready);
    assert_eq!(ids(&list), vec![3, 1]);
    assert_eq!(list.total_count(), 2);
}

#[tokio::test]
async fn test_yaml_table_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("portfolio_projects.yaml"),
        "- id: 1\n  title: Home lab\n  stack: Proxmox\n- id: 2\n  title: Blog\n",
    )
    .unwrap();
    let store = FileStore::new(dir.path());
    let mut list = ListController::new(Table::Projects, ListMode::Unbounded);

    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![2, 1]);
}

#[tokio::test]
async fn test_duplicate_ids_keep_first() {
    let mut first = Record::new(1, "first");
    first.stack = Some("Go".into());
    let store = MemoryStore::new().with_table(
        Table::Projects,
        vec![first, Record::new(1, "second"), Record::new(2, "other")],
    );
    let mut list = ListController::new(Table::Projects, ListMode::Unbounded);
    list.set_sort(SortMode::Title);

    settle(&mut list, &store).await;
    let titles: Vec<&str> = list.records().iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "other"]);
}

#[tokio::test]
async fn test_refresh_sees_replaced_rows() {
    let store = MemoryStore::new().with_table(Table::Works, vec![Record::new(1, "a")]);
    let mut list = ListController::new(Table::Works, ListMode::Preview { limit: 9 });
    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![1]);

    store.replace(Table::Works, vec![Record::new(1, "a"), Record::new(2, "b")]);
    list.refresh();
    assert!(list.needs_fetch());
    settle(&mut list, &store).await;
    assert_eq!(ids(&list), vec![2, 1]);
}

#[test]
fn test_rows_failing_any_predicate_are_dropped() {
    fn work(id: i64, title: &str, description: &str, category: &str, stack: &str) -> Record {
        let mut r = Record::new(id, title);
        r.description = Some(description.into());
        r.category = Some(category.into());
        r.stack = Some(stack.into());
        r
    }

    let mut list = ListController::new(Table::Works, ListMode::Unbounded);
    list.set_search("api");
    list.toggle_category("feature");
    list.set_stack_token(Some("go"));
    let ticket = list.request();

    // a store that ignores every filter it was sent
    let payload = FetchPayload {
        records: vec![
            work(1, "Payments API", "billing", "feature", "Go/Redis"),
            work(2, "Dashboard", "charts only", "feature", "Go"),
            work(3, "Gateway", "public API edge", "ops", "Go"),
            work(4, "API client", "sdk", "feature", "Django"),
            work(5, "Search", "query API", "feature", "Rust, go"),
        ],
        total_count: None,
    };
    assert_eq!(list.complete(ticket.seq, Ok(payload)), ApplyOutcome::Applied);

    assert_eq!(ids(&list), vec![1, 5]);
    assert_eq!(list.total_count(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// Fixed lists: timeline and stack catalog
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_timeline_groups_visible_works_by_year() {
    let store = data_store();
    let mut list = ListController::fixed(query::timeline_query(None));
    settle(&mut list, &store).await;

    assert_eq!(
        ids(&list),
        vec![15, 14, 13, 12, 11, 8, 7, 6, 5, 4, 3, 2, 1, 10]
    );

    let groups = group_by_year(list.records());
    let years: Vec<i32> = groups.iter().map(|g| g.year).collect();
    assert_eq!(years, vec![2024, 2023, 2022, 2021, 2020]);
    assert_eq!(groups[4].records[0].card_year(), "—");
}

#[tokio::test]
async fn test_timeline_hash_waits_for_data() {
    let store = data_store();
    let mut spy = ScrollSpy::new(SpyOffsets::default());
    assert_eq!(spy.apply_hash(Some("#year-2022")), None);
    assert_eq!(spy.pending_hash(), Some("year-2022"));

    let mut list = ListController::fixed(query::timeline_query(None));
    settle(&mut list, &store).await;
    let sections = layout_sections(&group_by_year(list.records()), 2);
    // 2024 holds five records: header + 10 rows + blank
    assert_eq!(sections[2].top, 20);

    assert_eq!(spy.set_sections(sections), Some(17));
    for _ in 0..50 {
        spy.on_frame();
        if !spy.is_animating() {
            break;
        }
    }
    assert!(!spy.is_animating());
    assert_eq!(spy.scroll_y(), 17);
    assert_eq!(spy.active_id(), Some("year-2022"));
}

#[tokio::test]
async fn test_stack_catalog_from_works() {
    let store = data_store();
    let mut list = ListController::fixed(query::stack_catalog_query());
    settle(&mut list, &store).await;

    let catalog = StackCatalog::from_records(list.records());
    let tokens: Vec<&str> = catalog.tokens().collect();
    assert!(tokens.contains(&"go"));
    assert!(tokens.contains(&"golang"));
    assert!(tokens.contains(&"kafka"));
    assert!(tokens.windows(2).all(|w| w[0] < w[1]));
}
