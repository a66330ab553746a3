use std::path::PathBuf;

use hdbresale_core::CellError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parquet file not found: {0}")]
    ParquetNotFound(PathBuf),

    #[error("no CSV files found at {0}")]
    NoCsvFiles(PathBuf),

    #[error("no part files found in {0}")]
    NoParts(PathBuf),

    #[error("{}: header does not match {}", .path.display(), .expected_from.display())]
    HeaderMismatch {
        path: PathBuf,
        expected_from: PathBuf,
    },

    #[error("{} line {line}: {source}", .path.display())]
    Cell {
        path: PathBuf,
        line: u64,
        source: CellError,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("{0}")]
    Other(String),
}
