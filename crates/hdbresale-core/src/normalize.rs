//! Batch normalization of raw resale records.
//!
//! Each row goes through the same fixed sequence of stages:
//!
//! 1. parse `remaining_lease` text into years
//! 2. synthesize `full_address` and `search_address`, dropping block and street
//! 3. derive `year` from `month`
//! 4. coerce `resale_price` to an integer
//! 5. canonicalize `flat_type`
//! 6. back-fill a missing `remaining_lease` (needs `year` from stage 3)
//!
//! The input batch is only borrowed; output records are freshly built.

use serde::Deserialize;
use tracing::{info, warn};

use crate::address;
use crate::derive;
use crate::error::{FieldError, NormalizeError, RowError};
use crate::lease;
use crate::record::{NormalizedRecord, RawBatch, RawRecord};

/// A batch must declare at least one of these columns to be transformed.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "remaining_lease",
    "block",
    "full_address",
    "street_name",
    "year",
    "resale_price",
    "flat_type",
    "lease_commence_date",
];

/// What to do with rows that fail a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Fail the whole batch, reporting every offending row.
    #[default]
    Abort,
    /// Drop failing rows, log each one, and report them alongside the output.
    Skip,
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    /// Rows dropped under [`RowPolicy::Skip`]. Always empty under `Abort`.
    pub skipped: Vec<RowError>,
}

/// Normalize a whole batch.
pub fn normalize(batch: &RawBatch, policy: RowPolicy) -> Result<Normalized, NormalizeError> {
    if !REQUIRED_COLUMNS.iter().any(|c| batch.has_column(c)) {
        return Err(NormalizeError::Schema {
            required: REQUIRED_COLUMNS.to_vec(),
        });
    }

    let mut records = Vec::with_capacity(batch.len());
    let mut failures = Vec::new();
    for (row, raw) in batch.records().iter().enumerate() {
        match normalize_record(raw) {
            Ok(record) => records.push(record),
            Err(cause) => failures.push(RowError::new(row, raw, cause)),
        }
    }

    if !failures.is_empty() {
        match policy {
            RowPolicy::Abort => return Err(NormalizeError::Rows(failures)),
            RowPolicy::Skip => {
                for failure in &failures {
                    warn!(%failure, "skipping row");
                }
            }
        }
    }

    info!(
        rows = batch.len(),
        normalized = records.len(),
        skipped = failures.len(),
        "normalized batch"
    );
    Ok(Normalized {
        records,
        skipped: failures,
    })
}

/// Run every stage on a single row.
pub fn normalize_record(raw: &RawRecord) -> Result<NormalizedRecord, FieldError> {
    let remaining_lease = lease::parse_remaining_lease(raw.remaining_lease.as_ref())?;

    let (full_address, search_address) =
        address::synthesize(raw.block.as_deref(), raw.street_name.as_deref())?;

    let month = raw
        .month
        .as_deref()
        .ok_or_else(|| FieldError::missing("month"))?;
    let year = derive::year_from_month(month)?;

    let resale_price = raw
        .resale_price
        .as_ref()
        .ok_or_else(|| FieldError::missing("resale_price"))
        .and_then(derive::coerce_price)?;

    let flat_type = raw.flat_type.as_deref().map(derive::canonical_flat_type);

    let remaining_lease =
        derive::backfill_remaining_lease(remaining_lease, year, raw.lease_commence_date)?;

    Ok(NormalizedRecord {
        month: month.to_string(),
        year,
        town: raw.town.clone(),
        flat_type,
        storey_range: raw.storey_range.clone(),
        floor_area_sqm: raw.floor_area_sqm,
        flat_model: raw.flat_model.clone(),
        lease_commence_date: raw.lease_commence_date,
        remaining_lease,
        resale_price,
        full_address,
        search_address,
    })
}
