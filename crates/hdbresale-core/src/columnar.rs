//! Conversions between resale records and Arrow record batches.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::compute::{CastOptions, cast_with_options};
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::record::{
    Coordinates, GeocodedRecord, LeaseValue, NormalizedRecord, PriceValue, RawBatch, RawRecord,
};
use crate::schema::resale;

// ── Records → Arrow ──

/// Build a batch with the [`resale::normalized_schema`].
pub fn normalized_to_batch(records: &[NormalizedRecord]) -> Result<RecordBatch, ArrowError> {
    let rows: Vec<&NormalizedRecord> = records.iter().collect();
    RecordBatch::try_new(
        Arc::new(resale::normalized_schema()),
        normalized_columns(&rows),
    )
}

/// Build a batch with the [`resale::geocoded_schema`].
pub fn geocoded_to_batch(records: &[GeocodedRecord]) -> Result<RecordBatch, ArrowError> {
    let rows: Vec<&NormalizedRecord> = records.iter().map(|r| &r.record).collect();
    let mut columns = normalized_columns(&rows);
    columns.push(Arc::new(Float64Array::from(
        records
            .iter()
            .map(|r| r.location.map(|c| c.latitude))
            .collect::<Vec<_>>(),
    )));
    columns.push(Arc::new(Float64Array::from(
        records
            .iter()
            .map(|r| r.location.map(|c| c.longitude))
            .collect::<Vec<_>>(),
    )));
    RecordBatch::try_new(Arc::new(resale::geocoded_schema()), columns)
}

fn normalized_columns(rows: &[&NormalizedRecord]) -> Vec<ArrayRef> {
    let text = |f: fn(&NormalizedRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(|r| f(r)).collect::<Vec<_>>()))
    };
    let opt_text = |f: fn(&NormalizedRecord) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(|r| f(r)).collect::<Vec<_>>()))
    };

    vec![
        text(|r| r.month.as_str()),
        Arc::new(Int32Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
        opt_text(|r| r.town.as_deref()),
        opt_text(|r| r.flat_type.as_deref()),
        opt_text(|r| r.storey_range.as_deref()),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.floor_area_sqm).collect::<Vec<_>>(),
        )),
        opt_text(|r| r.flat_model.as_deref()),
        Arc::new(Int32Array::from(
            rows.iter().map(|r| r.lease_commence_date).collect::<Vec<_>>(),
        )),
        Arc::new(Int32Array::from(
            rows.iter().map(|r| r.remaining_lease).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.resale_price).collect::<Vec<_>>(),
        )),
        text(|r| r.full_address.as_str()),
        text(|r| r.search_address.as_str()),
    ]
}

// ── Arrow → records ──

/// Read normalized (or geocoded) records back from an artifact batch.
///
/// `latitude`/`longitude` are optional; without them every location is `None`.
pub fn geocoded_from_batch(batch: &RecordBatch) -> Result<Vec<GeocodedRecord>, ArrowError> {
    let month = required(batch, "month", &DataType::Utf8)?;
    let year = required(batch, "year", &DataType::Int32)?;
    let price = required(batch, "resale_price", &DataType::Int64)?;
    let full = required(batch, "full_address", &DataType::Utf8)?;
    let search = required(batch, "search_address", &DataType::Utf8)?;
    let town = optional(batch, "town", &DataType::Utf8)?;
    let flat_type = optional(batch, "flat_type", &DataType::Utf8)?;
    let storey = optional(batch, "storey_range", &DataType::Utf8)?;
    let area = optional(batch, "floor_area_sqm", &DataType::Float64)?;
    let model = optional(batch, "flat_model", &DataType::Utf8)?;
    let commence = optional(batch, "lease_commence_date", &DataType::Int32)?;
    let lease = optional(batch, "remaining_lease", &DataType::Int32)?;
    let lat = optional(batch, "latitude", &DataType::Float64)?;
    let lon = optional(batch, "longitude", &DataType::Float64)?;

    let month_arr = downcast::<StringArray>(&month, "month")?;
    let year_arr = downcast::<Int32Array>(&year, "year")?;
    let price_arr = downcast::<Int64Array>(&price, "resale_price")?;
    let full_arr = downcast::<StringArray>(&full, "full_address")?;
    let search_arr = downcast::<StringArray>(&search, "search_address")?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let record = NormalizedRecord {
            month: non_null(month_arr, "month", row)?.value(row).to_string(),
            year: non_null(year_arr, "year", row)?.value(row),
            town: get_string(town.as_ref(), row),
            flat_type: get_string(flat_type.as_ref(), row),
            storey_range: get_string(storey.as_ref(), row),
            floor_area_sqm: get_f64(area.as_ref(), row),
            flat_model: get_string(model.as_ref(), row),
            lease_commence_date: get_i32(commence.as_ref(), row),
            remaining_lease: get_i32(lease.as_ref(), row),
            resale_price: non_null(price_arr, "resale_price", row)?.value(row),
            full_address: non_null(full_arr, "full_address", row)?.value(row).to_string(),
            search_address: non_null(search_arr, "search_address", row)?
                .value(row)
                .to_string(),
        };
        let location = match (get_f64(lat.as_ref(), row), get_f64(lon.as_ref(), row)) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };
        records.push(GeocodedRecord { record, location });
    }
    Ok(records)
}

/// Read raw records from an Arrow batch, e.g. one loaded from Parquet.
///
/// String columns may be `Utf8` or `LargeUtf8`. `remaining_lease` and
/// `resale_price` keep the distinction between text and numeric storage.
pub fn raw_from_batch(batch: &RecordBatch) -> Result<RawBatch, ArrowError> {
    let schema = batch.schema();
    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    let month = optional(batch, "month", &DataType::Utf8)?;
    let town = optional(batch, "town", &DataType::Utf8)?;
    let flat_type = optional(batch, "flat_type", &DataType::Utf8)?;
    let block = optional(batch, "block", &DataType::Utf8)?;
    let street = optional(batch, "street_name", &DataType::Utf8)?;
    let storey = optional(batch, "storey_range", &DataType::Utf8)?;
    let area = optional(batch, "floor_area_sqm", &DataType::Float64)?;
    let model = optional(batch, "flat_model", &DataType::Utf8)?;
    let commence = optional(batch, "lease_commence_date", &DataType::Int32)?;

    let lease = match batch.column_by_name("remaining_lease") {
        Some(col) if is_text(col.data_type()) => {
            Some(LeaseColumn::Text(strict_cast(col, &DataType::Utf8)?))
        }
        Some(col) => Some(LeaseColumn::Numeric(strict_cast(col, &DataType::Float64)?)),
        None => None,
    };
    let price = match batch.column_by_name("resale_price") {
        Some(col) if is_text(col.data_type()) => {
            Some(PriceColumn::Text(strict_cast(col, &DataType::Utf8)?))
        }
        Some(col) if is_float(col.data_type()) => {
            Some(PriceColumn::Float(strict_cast(col, &DataType::Float64)?))
        }
        Some(col) => Some(PriceColumn::Integer(strict_cast(col, &DataType::Int64)?)),
        None => None,
    };

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let remaining_lease = match &lease {
            Some(LeaseColumn::Text(col)) => get_string(Some(col), row).map(LeaseValue::Text),
            Some(LeaseColumn::Numeric(col)) => {
                get_f64(Some(col), row).and_then(LeaseValue::from_number)
            }
            None => None,
        };
        let resale_price = match &price {
            Some(PriceColumn::Text(col)) => get_string(Some(col), row).map(PriceValue::Text),
            Some(PriceColumn::Float(col)) => get_f64(Some(col), row).map(PriceValue::Float),
            Some(PriceColumn::Integer(col)) => get_i64(Some(col), row).map(PriceValue::Integer),
            None => None,
        };
        records.push(RawRecord {
            month: get_string(month.as_ref(), row),
            town: get_string(town.as_ref(), row),
            flat_type: get_string(flat_type.as_ref(), row),
            block: get_string(block.as_ref(), row),
            street_name: get_string(street.as_ref(), row),
            storey_range: get_string(storey.as_ref(), row),
            floor_area_sqm: get_f64(area.as_ref(), row),
            flat_model: get_string(model.as_ref(), row),
            lease_commence_date: get_i32(commence.as_ref(), row),
            remaining_lease,
            resale_price,
        });
    }
    Ok(RawBatch::new(columns, records))
}

enum LeaseColumn {
    Text(ArrayRef),
    Numeric(ArrayRef),
}

enum PriceColumn {
    Text(ArrayRef),
    Float(ArrayRef),
    Integer(ArrayRef),
}

// ── Helpers ──

fn is_text(ty: &DataType) -> bool {
    matches!(ty, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

fn is_float(ty: &DataType) -> bool {
    matches!(ty, DataType::Float16 | DataType::Float32 | DataType::Float64)
}

/// Cast a column, failing on any cell that does not convert instead of
/// turning it into null.
fn strict_cast(col: &ArrayRef, ty: &DataType) -> Result<ArrayRef, ArrowError> {
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(col, ty, &options)
}

fn optional(batch: &RecordBatch, name: &str, ty: &DataType) -> Result<Option<ArrayRef>, ArrowError> {
    batch.column_by_name(name).map(|c| strict_cast(c, ty)).transpose()
}

fn required(batch: &RecordBatch, name: &str, ty: &DataType) -> Result<ArrayRef, ArrowError> {
    optional(batch, name, ty)?
        .ok_or_else(|| ArrowError::SchemaError(format!("missing column {name}")))
}

fn downcast<'a, T: Array + 'static>(col: &'a ArrayRef, name: &str) -> Result<&'a T, ArrowError> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ArrowError::CastError(format!("unexpected type for column {name}")))
}

fn non_null<'a, T: Array>(arr: &'a T, name: &str, row: usize) -> Result<&'a T, ArrowError> {
    if arr.is_null(row) {
        return Err(ArrowError::InvalidArgumentError(format!(
            "null {name} at row {row}"
        )));
    }
    Ok(arr)
}

fn get_string(col: Option<&ArrayRef>, row: usize) -> Option<String> {
    let arr = col?.as_any().downcast_ref::<StringArray>()?;
    (!arr.is_null(row)).then(|| arr.value(row).to_string())
}

fn get_f64(col: Option<&ArrayRef>, row: usize) -> Option<f64> {
    let arr = col?.as_any().downcast_ref::<Float64Array>()?;
    (!arr.is_null(row)).then(|| arr.value(row))
}

fn get_i32(col: Option<&ArrayRef>, row: usize) -> Option<i32> {
    let arr = col?.as_any().downcast_ref::<Int32Array>()?;
    (!arr.is_null(row)).then(|| arr.value(row))
}

fn get_i64(col: Option<&ArrayRef>, row: usize) -> Option<i64> {
    let arr = col?.as_any().downcast_ref::<Int64Array>()?;
    (!arr.is_null(row)).then(|| arr.value(row))
}
