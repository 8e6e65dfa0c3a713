//! A table store backed by a directory of JSON / YAML files.
//!
//! Layout: `<dir>/portfolio_works.json` (or `.yaml` / `.yml`), one file per
//! table, each an array of rows. Files are read on every call so edits show
//! up on the next fetch, like a remote store would.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::model::{Record, Table};
use crate::query::QueryDescription;

use super::{eval, RecordStore, StoreError, StorePage};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    latency: Option<Duration>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            latency: None,
        }
    }

    /// Delay every call, to exercise out-of-order completion.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `table`, if one exists.
    pub fn table_path(&self, table: Table) -> Option<PathBuf> {
        ["json", "yaml", "yml"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{ext}", table.name())))
            .find(|p| p.exists())
    }

    /// Read and decode every row of `table`.
    pub async fn load_table(&self, table: Table) -> Result<Vec<Record>, StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let path = self.table_path(table).ok_or_else(|| StoreError::TableNotFound {
            table: table.name().to_string(),
            dir: self.dir.clone(),
        })?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e,
            })?;

        let rows = parse_rows(&path, &content)?;
        debug!(table = table.name(), rows = rows.len(), "loaded table");
        Ok(rows)
    }
}

/// Decode a table file. The extension picks the format.
///
/// The file must hold an array; a row that does not decode as a record is
/// logged and skipped so one bad row never hides the rest of the table.
pub fn parse_rows(path: &Path, content: &str) -> Result<Vec<Record>, StoreError> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let decode_error = |message: String| StoreError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let rows: Vec<Result<Record, String>> = if is_yaml {
        serde_yaml::from_str::<Vec<serde_yaml::Value>>(content)
            .map_err(|e| decode_error(e.to_string()))?
            .into_iter()
            .map(|row| serde_yaml::from_value::<Record>(row).map_err(|e| e.to_string()))
            .collect()
    } else {
        serde_json::from_str::<Vec<serde_json::Value>>(content)
            .map_err(|e| decode_error(e.to_string()))?
            .into_iter()
            .map(|row| serde_json::from_value::<Record>(row).map_err(|e| e.to_string()))
            .collect()
    };

    Ok(rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match row {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(path = %path.display(), index, %error, "skipping malformed row");
                None
            }
        })
        .collect())
}

impl RecordStore for FileStore {
    fn fetch<'a>(
        &'a self,
        query: &'a QueryDescription,
    ) -> BoxFuture<'a, Result<StorePage, StoreError>> {
        async move {
            let rows = self.load_table(query.table).await?;
            Ok(eval::evaluate(rows, query))
        }
        .boxed()
    }

    fn count<'a>(&'a self, query: &'a QueryDescription) -> BoxFuture<'a, Result<u64, StoreError>> {
        async move {
            let rows = self.load_table(query.table).await?;
            Ok(eval::count(&rows, query))
        }
        .boxed()
    }
}
