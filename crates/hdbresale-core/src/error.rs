use thiserror::Error;

use crate::record::RawRecord;

/// Why a single field of a row could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("cannot parse {field} from {value:?}")]
    Parse { field: &'static str, value: String },

    #[error("missing {field}")]
    Missing { field: &'static str },
}

impl FieldError {
    pub fn parse(field: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            field,
            value: value.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::Missing { field }
    }
}

/// A failed row, identified by position and the fields a reader uses to find it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "row {row} (block {}, street {}, month {}): {cause}",
    display_or_dash(.block),
    display_or_dash(.street_name),
    display_or_dash(.month)
)]
pub struct RowError {
    pub row: usize,
    pub block: Option<String>,
    pub street_name: Option<String>,
    pub month: Option<String>,
    pub cause: FieldError,
}

impl RowError {
    pub fn new(row: usize, raw: &RawRecord, cause: FieldError) -> Self {
        Self {
            row,
            block: raw.block.clone(),
            street_name: raw.street_name.clone(),
            month: raw.month.clone(),
            cause,
        }
    }
}

fn display_or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(
        "dataset is unsuitable for transformation: none of the required columns ({}) is present",
        .required.join(", ")
    )]
    Schema { required: Vec<&'static str> },

    #[error("{} row(s) failed normalization:\n{}", .0.len(), list_rows(.0))]
    Rows(Vec<RowError>),
}

fn list_rows(rows: &[RowError]) -> String {
    rows.iter()
        .map(|r| format!("  {r}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A delimited-text cell that does not parse as its column's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column {column}: cannot parse {value:?}")]
pub struct CellError {
    pub column: String,
    pub value: String,
}

impl CellError {
    pub fn new(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}
