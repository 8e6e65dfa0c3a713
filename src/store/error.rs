use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("table {table} not found in {dir}")]
    TableNotFound { table: String, dir: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid rows in {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
