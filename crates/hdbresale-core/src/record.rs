//! Resale transaction records before and after normalization.

use std::collections::BTreeSet;

use crate::error::CellError;

/// A raw `remaining_lease` cell.
///
/// Older datasets carry a plain year count; newer ones carry free text such
/// as `"61 years 04 months"` that the lease parser converts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseValue {
    Text(String),
    Years(i32),
}

impl LeaseValue {
    /// Classify a delimited-text cell. Integer-valued numbers (`"65"`, `"65.0"`)
    /// become [`LeaseValue::Years`]; anything else is kept as text.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if let Ok(n) = trimmed.parse::<i32>() {
            return Self::Years(n);
        }
        if let Ok(f) = trimmed.parse::<f64>()
            && let Some(n) = Self::from_number(f)
        {
            return n;
        }
        Self::Text(cell.to_string())
    }

    /// A numeric lease, rounded half-up to whole years. `None` for NaN,
    /// infinities and values outside the `i32` range.
    pub fn from_number(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let rounded = (value + 0.5).floor();
        if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
            return None;
        }
        Some(Self::Years(rounded as i32))
    }
}

/// A raw `resale_price` cell: numeric, or numeric-looking text.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// One resale transaction as read from a source. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub month: Option<String>,
    pub town: Option<String>,
    pub flat_type: Option<String>,
    pub block: Option<String>,
    pub street_name: Option<String>,
    pub storey_range: Option<String>,
    pub floor_area_sqm: Option<f64>,
    pub flat_model: Option<String>,
    pub lease_commence_date: Option<i32>,
    pub remaining_lease: Option<LeaseValue>,
    pub resale_price: Option<PriceValue>,
}

impl RawRecord {
    /// Build a record from `(column, cell)` pairs of a delimited-text row.
    ///
    /// Empty cells are missing values and unknown columns are ignored.
    /// Numeric columns that do not parse fail with a [`CellError`].
    pub fn from_text_fields<'a, I>(fields: I) -> Result<Self, CellError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Self::default();
        for (column, cell) in fields {
            if cell.trim().is_empty() {
                continue;
            }
            let text = || Some(cell.to_string());
            match column {
                "month" => record.month = text(),
                "town" => record.town = text(),
                "flat_type" => record.flat_type = text(),
                "block" => record.block = text(),
                "street_name" => record.street_name = text(),
                "storey_range" => record.storey_range = text(),
                "flat_model" => record.flat_model = text(),
                "floor_area_sqm" => {
                    let area = cell
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| CellError::new(column, cell))?;
                    record.floor_area_sqm = Some(area);
                }
                "lease_commence_date" => {
                    let year = cell
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| CellError::new(column, cell))?;
                    record.lease_commence_date = Some(year);
                }
                "remaining_lease" => record.remaining_lease = Some(LeaseValue::from_cell(cell)),
                "resale_price" => record.resale_price = Some(PriceValue::Text(cell.to_string())),
                _ => {}
            }
        }
        Ok(record)
    }
}

/// A batch of raw records together with the column names its source declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    columns: BTreeSet<String>,
    records: Vec<RawRecord>,
}

impl RawBatch {
    pub fn new<I, S>(columns: I, records: Vec<RawRecord>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            records,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append another batch's rows. Column sets are merged.
    pub fn extend(&mut self, other: RawBatch) {
        self.columns.extend(other.columns);
        self.records.extend(other.records);
    }
}

/// A cleaned, analysis-ready resale transaction.
///
/// `block` and `street_name` are folded into the two address fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub month: String,
    pub year: i32,
    pub town: Option<String>,
    pub flat_type: Option<String>,
    pub storey_range: Option<String>,
    pub floor_area_sqm: Option<f64>,
    pub flat_model: Option<String>,
    pub lease_commence_date: Option<i32>,
    pub remaining_lease: Option<i32>,
    pub resale_price: i64,
    pub full_address: String,
    pub search_address: String,
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A normalized record with the geocoder's answer for its search address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedRecord {
    pub record: NormalizedRecord,
    pub location: Option<Coordinates>,
}
