//! Display and geocoder-query addresses built from block and street name.

use crate::error::FieldError;

const SEARCH_SUFFIX: &str = "+SINGAPORE";

/// `"<block> <street>"`, for display.
pub fn full_address(block: &str, street_name: &str) -> String {
    format!("{block} {street_name}")
}

/// `"<block>+<street with spaces as +>+SINGAPORE"`, shaped for a geocoder query
/// string. Punctuation other than spaces is passed through unescaped.
pub fn search_address(block: &str, street_name: &str) -> String {
    format!("{block}+{}{SEARCH_SUFFIX}", street_name.replace(' ', "+"))
}

/// Both addresses for a row. A row missing either part fails instead of
/// producing a partial address.
pub fn synthesize(
    block: Option<&str>,
    street_name: Option<&str>,
) -> Result<(String, String), FieldError> {
    let block = block.ok_or_else(|| FieldError::missing("block"))?;
    let street_name = street_name.ok_or_else(|| FieldError::missing("street_name"))?;
    Ok((
        full_address(block, street_name),
        search_address(block, street_name),
    ))
}
