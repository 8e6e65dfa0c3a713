//! Record store seam. The list engine only talks to [`RecordStore`].

pub mod error;
pub mod eval;
pub mod file;
pub mod memory;

use futures::future::BoxFuture;

use crate::model::Record;
use crate::query::QueryDescription;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// One fetched page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorePage {
    pub records: Vec<Record>,
    /// Present when the query asked for an exact count.
    pub total_count: Option<u64>,
}

/// A queryable record collection (hosted table store, local files, mocks).
///
/// Calls are not cancellable; callers that lose interest drop the result.
pub trait RecordStore: Send + Sync {
    /// Rows matching `query`, ordered and sliced as it asks.
    fn fetch<'a>(&'a self, query: &'a QueryDescription)
        -> BoxFuture<'a, Result<StorePage, StoreError>>;

    /// Count of rows matching the predicates of `query`, ignoring its range.
    fn count<'a>(&'a self, query: &'a QueryDescription) -> BoxFuture<'a, Result<u64, StoreError>>;
}
