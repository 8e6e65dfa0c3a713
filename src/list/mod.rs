//! List controller: filter state, fetch sequencing, fail-soft results.
//!
//! ```text
//! Idle ──request──▶ Loading ──complete(ok)──▶ Ready
//!                     ▲   └──complete(err)──▶ Failed
//!                     └──── filter / sort / page change
//! ```
//!
//! Every request gets a sequence number. Only the newest one may land; any
//! older completion is dropped.

pub mod fetch;

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::model::tokens::normalize_token;
use crate::model::{Record, RecordId, SortMode, Table};
use crate::query::{self, FilterState, ListMode, PageWindow, Pagination, QueryDescription};
use crate::store::{eval, StoreError};

pub use fetch::{execute, FetchPayload};

pub type RequestSeq = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading { seq: RequestSeq },
    Ready,
    Failed,
}

/// What a caller needs to run one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: RequestSeq,
    pub query: QueryDescription,
    /// Separate head-only count, paged lists only.
    pub count_query: Option<QueryDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer request was issued after this one.
    Discarded,
    /// The page fell past the last page; it was clamped and a refetch is due.
    Reclamped { page: u32 },
}

/// Where a list's query comes from.
#[derive(Debug, Clone)]
enum QuerySource {
    /// Built from the filter state on every request.
    Filtered { table: Table, mode: ListMode },
    /// A fixed query (year timeline, catalog); filters do not apply.
    Fixed(QueryDescription),
}

#[derive(Debug, Clone)]
pub struct ListController {
    source: QuerySource,
    filter: FilterState,
    page: u32,
    state: ListState,
    records: Vec<Record>,
    total_count: u64,
    next_seq: RequestSeq,
    in_flight: Option<(RequestSeq, QueryDescription)>,
    dirty: bool,
}

impl ListController {
    pub fn new(table: Table, mode: ListMode) -> Self {
        Self::with_source(QuerySource::Filtered { table, mode })
    }

    pub fn fixed(query: QueryDescription) -> Self {
        Self::with_source(QuerySource::Fixed(query))
    }

    fn with_source(source: QuerySource) -> Self {
        Self {
            source,
            filter: FilterState::default(),
            page: 1,
            state: ListState::Idle,
            records: Vec::new(),
            total_count: 0,
            next_seq: 1,
            in_flight: None,
            // mounting triggers the first fetch
            dirty: true,
        }
    }

    /// Start on a page taken from the location. Not clamped until the first
    /// count arrives; see [`ApplyOutcome::Reclamped`].
    pub fn with_initial_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Mount again: empty filters, no rows, a fetch due. Sequence numbers
    /// keep counting so completions from before the remount stay stale.
    pub fn remount(&mut self, page: u32) {
        self.filter = FilterState::default();
        self.page = page.max(1);
        self.state = ListState::Idle;
        self.records.clear();
        self.total_count = 0;
        self.in_flight = None;
        self.dirty = true;
    }

    // -- accessors -----------------------------------------------------------

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ListState::Loading { .. })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn mode(&self) -> Option<ListMode> {
        match &self.source {
            QuerySource::Filtered { mode, .. } => Some(*mode),
            QuerySource::Fixed(_) => None,
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self.mode(), Some(ListMode::Paged { .. }))
    }

    pub fn pagination(&self) -> Pagination {
        let page_size = match self.mode() {
            Some(ListMode::Paged { page_size }) => page_size,
            _ => u32::try_from(self.records.len()).unwrap_or(u32::MAX),
        };
        Pagination {
            page: self.page,
            page_size: page_size.max(1),
            total_count: self.total_count,
        }
    }

    pub fn page_window(&self, width: u32) -> PageWindow {
        self.pagination().window(width)
    }

    // -- filter mutations ----------------------------------------------------
    //
    // Each returns whether anything changed. A change resets the page and
    // marks the list for refetch.

    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.filter.search_text == text {
            return false;
        }
        self.filter.search_text = text;
        self.invalidate()
    }

    pub fn toggle_category(&mut self, category: &str) -> bool {
        if !self.filter.categories.remove(category) {
            self.filter.categories.insert(category.to_string());
        }
        self.invalidate()
    }

    pub fn set_categories(&mut self, categories: BTreeSet<String>) -> bool {
        if self.filter.categories == categories {
            return false;
        }
        self.filter.categories = categories;
        self.invalidate()
    }

    pub fn set_stack_token(&mut self, token: Option<&str>) -> bool {
        let token = token.and_then(normalize_token);
        if self.filter.stack_token == token {
            return false;
        }
        self.filter.stack_token = token;
        self.invalidate()
    }

    pub fn set_sort(&mut self, sort: SortMode) -> bool {
        if self.filter.sort == sort {
            return false;
        }
        self.filter.sort = sort;
        self.invalidate()
    }

    /// Clear search, categories and stack. Sort is kept.
    pub fn reset_filters(&mut self) -> bool {
        if !self.filter.is_narrowed() {
            return false;
        }
        self.filter = FilterState {
            sort: self.filter.sort,
            ..FilterState::default()
        };
        self.invalidate()
    }

    /// Move to a page, clamped into `[1, total_pages]`.
    pub fn set_page(&mut self, requested: i64) -> bool {
        let page = self.pagination().clamp(requested);
        if page == self.page {
            return false;
        }
        self.page = page;
        self.dirty = true;
        true
    }

    /// Refetch with the current state (data changed underneath).
    pub fn refresh(&mut self) {
        self.dirty = true;
    }

    fn invalidate(&mut self) -> bool {
        self.page = 1;
        self.dirty = true;
        true
    }

    // -- fetch lifecycle -----------------------------------------------------

    pub fn needs_fetch(&self) -> bool {
        self.dirty
    }

    /// Issue a request if the list is marked for refetch.
    pub fn poll_request(&mut self) -> Option<FetchTicket> {
        self.dirty.then(|| self.request())
    }

    /// Issue a request now. Any request still in flight becomes stale.
    pub fn request(&mut self) -> FetchTicket {
        self.dirty = false;
        let seq = self.next_seq;
        self.next_seq += 1;

        let (query, count_query) = match &self.source {
            QuerySource::Filtered { table, mode } => {
                let q = query::build(*table, &self.filter, *mode, self.page);
                let count = q.is_paged().then(|| q.count_query());
                (q, count)
            }
            QuerySource::Fixed(q) => (q.clone(), None),
        };

        debug!(seq, query = %query::postgrest::describe(&query), "list fetch issued");
        self.in_flight = Some((seq, query.clone()));
        self.state = ListState::Loading { seq };

        FetchTicket {
            seq,
            query,
            count_query,
        }
    }

    /// Land a completed fetch. Stale completions are dropped silently.
    pub fn complete(
        &mut self,
        seq: RequestSeq,
        result: Result<FetchPayload, StoreError>,
    ) -> ApplyOutcome {
        let query = match self.in_flight.take() {
            Some((latest, query)) if latest == seq => query,
            other => {
                self.in_flight = other;
                debug!(seq, "discarding stale list response");
                return ApplyOutcome::Discarded;
            }
        };

        match result {
            Ok(payload) => {
                let reported = payload.total_count;
                self.records = normalize(payload.records, &query);
                self.total_count = match (reported, &query.post_filter_token) {
                    (Some(n), _) if query.is_paged() => n,
                    (Some(n), None) => n,
                    _ => self.records.len() as u64,
                };
                self.state = ListState::Ready;
                debug!(
                    seq,
                    rows = self.records.len(),
                    total = self.total_count,
                    "list fetch applied"
                );

                if self.is_paged() {
                    let last = self.pagination().total_pages();
                    if self.page > last {
                        self.page = last;
                        self.dirty = true;
                        return ApplyOutcome::Reclamped { page: last };
                    }
                }
                ApplyOutcome::Applied
            }
            Err(e) => {
                warn!(seq, error = %e, "list fetch failed, showing empty list");
                self.records.clear();
                self.total_count = 0;
                self.state = ListState::Failed;
                ApplyOutcome::Applied
            }
        }
    }
}

/// Enforce what the query promised on whatever the store returned: the
/// exact stack token (the store only prefilters by substring), every
/// predicate, and unique ids.
fn normalize(records: Vec<Record>, query: &QueryDescription) -> Vec<Record> {
    let mut seen = BTreeSet::new();
    let before = records.len();
    let out: Vec<Record> = records
        .into_iter()
        .filter(|r| query.filters.iter().all(|p| eval::matches_predicate(r, p)))
        .filter(|r| {
            query
                .post_filter_token
                .as_deref()
                .map_or(true, |t| r.has_stack_token(t))
        })
        .filter(|r| {
            let fresh = seen.insert(r.id);
            if !fresh {
                warn!(id = %r.id, "duplicate record id in response, keeping first");
            }
            fresh
        })
        .collect();
    if out.len() != before {
        debug!(dropped = before - out.len(), "rows removed after fetch");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(records: Vec<Record>, total: Option<u64>) -> Result<FetchPayload, StoreError> {
        Ok(FetchPayload {
            records,
            total_count: total,
        })
    }

    #[test]
    fn test_new_list_wants_a_fetch() {
        let mut list = ListController::new(Table::Works, ListMode::Preview { limit: 9 });
        assert_eq!(list.state(), ListState::Idle);
        let ticket = list.poll_request().unwrap();
        assert_eq!(ticket.seq, 1);
        assert!(ticket.count_query.is_none());
        assert!(list.poll_request().is_none());
        assert_eq!(list.state(), ListState::Loading { seq: 1 });
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 2 });
        let t = list.request();
        list.complete(t.seq, payload(vec![Record::new(1, "a")], Some(10)));
        assert!(list.set_page(3));
        assert_eq!(list.page(), 3);
        assert!(list.set_search("api"));
        assert_eq!(list.page(), 1);
        assert!(list.needs_fetch());
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut list = ListController::new(Table::Works, ListMode::Unbounded);
        let _ = list.request();
        assert!(!list.set_search(""));
        assert!(!list.set_sort(SortMode::Recent));
        assert!(!list.set_stack_token(Some("  ")));
        assert!(!list.reset_filters());
        assert!(!list.needs_fetch());
    }

    #[test]
    fn test_failure_is_soft() {
        let mut list = ListController::new(Table::Works, ListMode::Paged { page_size: 2 });
        let t = list.request();
        list.complete(t.seq, payload(vec![Record::new(1, "a")], Some(5)));
        assert_eq!(list.total_count(), 5);

        let t = list.request();
        let outcome = list.complete(t.seq, Err(StoreError::Unavailable("down".into())));
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(list.state(), ListState::Failed);
        assert!(list.records().is_empty());
        assert_eq!(list.total_count(), 0);
        assert_eq!(list.pagination().total_pages(), 1);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut list = ListController::new(Table::Works, ListMode::Unbounded);
        let r1 = list.request();
        list.set_search("api");
        let r2 = list.request();

        let mut api = Record::new(2, "api gateway");
        api.description = Some("x".into());
        assert_eq!(list.complete(r2.seq, payload(vec![api], None)), ApplyOutcome::Applied);
        assert_eq!(
            list.complete(r1.seq, payload(vec![Record::new(1, "other")], None)),
            ApplyOutcome::Discarded
        );
        assert_eq!(list.records().len(), 1);
        assert_eq!(list.records()[0].id, RecordId(2));
    }

    #[test]
    fn test_page_past_end_is_reclamped() {
        let mut list =
            ListController::new(Table::Projects, ListMode::Paged { page_size: 12 }).with_initial_page(7);
        let t = list.request();
        assert_eq!(
            t.query.range,
            crate::query::Range::Window {
                offset: 72,
                count: 12
            }
        );
        let outcome = list.complete(t.seq, payload(vec![], Some(25)));
        assert_eq!(outcome, ApplyOutcome::Reclamped { page: 3 });
        assert!(list.needs_fetch());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut list = ListController::new(Table::Projects, ListMode::Unbounded);
        let t = list.request();
        list.complete(
            t.seq,
            payload(vec![Record::new(1, "first"), Record::new(1, "second")], None),
        );
        assert_eq!(list.records().len(), 1);
        assert_eq!(list.records()[0].title, "first");
    }
}
