//! Tables held in memory. Used by tests and demos.

use std::collections::HashMap;
use std::sync::RwLock;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::model::{Record, Table};
use crate::query::QueryDescription;

use super::{eval, RecordStore, StoreError, StorePage};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: Table, rows: Vec<Record>) -> Self {
        self.replace(table, rows);
        self
    }

    /// Swap a table's rows.
    pub fn replace(&self, table: Table, rows: Vec<Record>) {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(table, rows);
        }
    }

    fn rows(&self, table: Table) -> Result<Vec<Record>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        Ok(tables.get(&table).cloned().unwrap_or_default())
    }
}

impl RecordStore for MemoryStore {
    fn fetch<'a>(
        &'a self,
        query: &'a QueryDescription,
    ) -> BoxFuture<'a, Result<StorePage, StoreError>> {
        let result = self.rows(query.table).map(|rows| eval::evaluate(rows, query));
        futures::future::ready(result).boxed()
    }

    fn count<'a>(&'a self, query: &'a QueryDescription) -> BoxFuture<'a, Result<u64, StoreError>> {
        let result = self.rows(query.table).map(|rows| eval::count(&rows, query));
        futures::future::ready(result).boxed()
    }
}
