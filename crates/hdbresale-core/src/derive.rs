//! Fields computed from other fields of the same row.

use crate::error::FieldError;
use crate::record::PriceValue;

/// Term of an HDB lease at issue, in years.
pub const LEASE_TERM_YEARS: i32 = 99;

const MULTI_GENERATION_RAW: &str = "MULTI GENERATION";
const MULTI_GENERATION: &str = "MULTI-GENERATION";

/// Calendar year of a `"YYYY-MM"` month string. Both segments must be present.
pub fn year_from_month(month: &str) -> Result<i32, FieldError> {
    let mut parts = month.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(m), None) if !m.trim().is_empty() => year
            .parse::<i32>()
            .map_err(|_| FieldError::parse("month", month)),
        _ => Err(FieldError::parse("month", month)),
    }
}

/// Integer resale price, truncated toward zero: `349999.9` is 349999.
pub fn coerce_price(value: &PriceValue) -> Result<i64, FieldError> {
    match value {
        PriceValue::Integer(n) => Ok(*n),
        PriceValue::Float(f) => {
            truncate(*f).ok_or_else(|| FieldError::parse("resale_price", f.to_string()))
        }
        PriceValue::Text(text) => {
            let trimmed = text.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(n);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(truncate)
                .ok_or_else(|| FieldError::parse("resale_price", text.as_str()))
        }
    }
}

fn truncate(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let t = value.trunc();
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return None;
    }
    Some(t as i64)
}

/// Rewrite the one inconsistent flat-type spelling. Exact and case-sensitive.
pub fn canonical_flat_type(flat_type: &str) -> String {
    if flat_type == MULTI_GENERATION_RAW {
        MULTI_GENERATION.to_string()
    } else {
        flat_type.to_string()
    }
}

/// Fill a missing remaining lease from the lease start and transaction year.
///
/// A present lease is kept; without a commencement year nothing is filled.
/// A commencement year too far from `year` to compute with is a parse error.
pub fn backfill_remaining_lease(
    remaining_lease: Option<i32>,
    year: i32,
    lease_commence_date: Option<i32>,
) -> Result<Option<i32>, FieldError> {
    let (None, Some(start)) = (remaining_lease, lease_commence_date) else {
        return Ok(remaining_lease);
    };
    year.checked_sub(start)
        .and_then(|elapsed| LEASE_TERM_YEARS.checked_sub(elapsed))
        .map(Some)
        .ok_or_else(|| FieldError::parse("lease_commence_date", start.to_string()))
}
