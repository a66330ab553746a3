//! The `summary` subcommand: select records from an artifact and print
//! per-category counts and price statistics.

use hdbresale_core::aggregate::{self, Aggregation, Column};
use hdbresale_core::slice::{self, FeatureFilter, YearRange};
use hdbresale_core::{GeocodedRecord, NormalizedRecord};

use crate::display;

/// Which records a summary covers.
#[derive(Debug, Default)]
pub struct Selection {
    pub years: Option<YearRange>,
    pub features: FeatureFilter,
    /// Keep only records geocoded inside Singapore.
    pub singapore_only: bool,
}

impl Selection {
    pub fn select<'a>(&self, records: &'a [GeocodedRecord]) -> Vec<&'a NormalizedRecord> {
        let located: Vec<&GeocodedRecord> = if self.singapore_only {
            slice::singapore_locations(records)
        } else {
            records.iter().collect()
        };
        located
            .into_iter()
            .map(|r| &r.record)
            .filter(|r| self.years.is_none_or(|range| range.contains(r.year)))
            .filter(|r| self.features.matches(r))
            .collect()
    }
}

pub fn print_summary(
    records: &[&NormalizedRecord],
    by: Column,
    aggregation: Aggregation,
    limit: usize,
) -> anyhow::Result<()> {
    println!("{} transactions selected", records.len());
    if let Some(max) = aggregate::highest_price(records.iter().copied()) {
        println!("Highest resale price: {max}");
    }
    println!();

    for column in [Column::Town, Column::FlatType] {
        let mut counts = aggregate::count_by(records.iter().copied(), column);
        counts.truncate(limit);
        let batch = display::counts_batch(column, &counts)?;
        display::print_table(&format!("Transactions by {column}"), &batch)?;
    }

    let prices = aggregate::price_by(records.iter().copied(), by, aggregation);
    let batch = display::prices_batch(by, aggregation, &prices)?;
    display::print_table(
        &format!("{} resale price by {by}", aggregation.name()),
        &batch,
    )?;

    let pivot = aggregate::price_pivot(
        records.iter().copied(),
        Column::Town,
        Column::FlatType,
        aggregation,
    );
    let batch = display::pivot_batch(Column::Town, &pivot)?;
    display::print_table(
        &format!("{} resale price by town and flat_type", aggregation.name()),
        &batch,
    )?;
    Ok(())
}
