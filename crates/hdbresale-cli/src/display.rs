//! Summary tables for the terminal.
//!
//! Aggregates are turned into small RecordBatches and printed with Arrow's
//! pretty printer.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use hdbresale_core::aggregate::{Aggregation, Column, GroupKey, PricePivot};

fn key_array(keys: impl Iterator<Item = String>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(keys))
}

/// Two-column table: category and transaction count.
pub fn counts_batch(
    column: Column,
    counts: &[(GroupKey, usize)],
) -> Result<RecordBatch, ArrowError> {
    let schema = Schema::new(vec![
        Field::new(column.name(), DataType::Utf8, false),
        Field::new("transactions", DataType::UInt64, false),
    ]);
    let values: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        counts.iter().map(|(_, n)| *n as u64),
    ));
    RecordBatch::try_new(
        Arc::new(schema),
        vec![key_array(counts.iter().map(|(k, _)| k.to_string())), values],
    )
}

/// Two-column table: category and price statistic, e.g. `median_resale_price`.
pub fn prices_batch(
    column: Column,
    aggregation: Aggregation,
    prices: &[(GroupKey, f64)],
) -> Result<RecordBatch, ArrowError> {
    let schema = Schema::new(vec![
        Field::new(column.name(), DataType::Utf8, false),
        Field::new(
            format!("{}_resale_price", aggregation.name()),
            DataType::Float64,
            false,
        ),
    ]);
    let values: ArrayRef = Arc::new(Float64Array::from_iter_values(
        prices.iter().map(|(_, v)| *v),
    ));
    RecordBatch::try_new(
        Arc::new(schema),
        vec![key_array(prices.iter().map(|(k, _)| k.to_string())), values],
    )
}

/// One row per pivot row key, one nullable price column per column key.
pub fn pivot_batch(rows: Column, pivot: &PricePivot) -> Result<RecordBatch, ArrowError> {
    let mut fields = vec![Field::new(rows.name(), DataType::Utf8, false)];
    let mut columns = vec![key_array(pivot.rows.iter().map(|k| k.to_string()))];
    for (j, key) in pivot.columns.iter().enumerate() {
        fields.push(Field::new(key.to_string(), DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            pivot.cells.iter().map(|row| row[j]).collect::<Vec<_>>(),
        )));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

pub fn print_table(title: &str, batch: &RecordBatch) -> anyhow::Result<()> {
    println!("{title}");
    if batch.num_rows() == 0 {
        println!("  (no rows)");
    } else {
        println!("{}", pretty_format_batches(std::slice::from_ref(batch))?);
    }
    println!();
    Ok(())
}
