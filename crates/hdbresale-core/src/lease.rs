//! Remaining-lease parsing.
//!
//! HDB publishes the remaining lease as free text in two shapes:
//!
//! - `"<N> years"`, e.g. `"56 years"`
//! - `"<N> years <M> months"`, e.g. `"68 years 03 months"`
//!
//! Both collapse to whole years. Months round half-up in integer months, so
//! `"61 years 06 months"` is 62.

use crate::error::FieldError;
use crate::record::LeaseValue;

const FIELD: &str = "remaining_lease";

/// Convert a raw lease cell into whole years.
///
/// Values that are already numeric, and missing values, pass through as-is.
pub fn parse_remaining_lease(value: Option<&LeaseValue>) -> Result<Option<i32>, FieldError> {
    match value {
        None => Ok(None),
        Some(LeaseValue::Years(n)) => Ok(Some(*n)),
        Some(LeaseValue::Text(text)) => parse_lease_text(text).map(Some),
    }
}

/// Parse `"<N> years"` or `"<N> years <M> months"` into whole years.
///
/// Leading tokens are read as plain decimal, so zero-padded values such as
/// `"08 years"` parse as 8.
pub fn parse_lease_text(text: &str) -> Result<i32, FieldError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let years = tokens
        .first()
        .and_then(|t| t.parse::<u32>().ok())
        .ok_or_else(|| FieldError::parse(FIELD, text))?;

    let total = if tokens.len() <= 2 {
        u64::from(years)
    } else {
        let months = tokens[2]
            .parse::<u32>()
            .map_err(|_| FieldError::parse(FIELD, text))?;
        let total_months = u64::from(years) * 12 + u64::from(months);
        (total_months + 6) / 12
    };

    i32::try_from(total).map_err(|_| FieldError::parse(FIELD, text))
}
