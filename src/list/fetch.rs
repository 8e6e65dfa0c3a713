//! Run a [`FetchTicket`] against a store.

use crate::model::Record;
use crate::store::{RecordStore, StoreError};

use super::FetchTicket;

/// Rows plus the count a list should report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPayload {
    pub records: Vec<Record>,
    pub total_count: Option<u64>,
}

/// Fetch the page and, for paged lists, the separate count. Either call
/// failing fails the whole fetch.
pub async fn execute(
    store: &dyn RecordStore,
    ticket: &FetchTicket,
) -> Result<FetchPayload, StoreError> {
    match &ticket.count_query {
        Some(count_query) => {
            let (page, count) =
                futures::try_join!(store.fetch(&ticket.query), store.count(count_query))?;
            Ok(FetchPayload {
                records: page.records,
                total_count: Some(count),
            })
        }
        None => {
            let page = store.fetch(&ticket.query).await?;
            Ok(FetchPayload {
                records: page.records,
                total_count: page.total_count,
            })
        }
    }
}
