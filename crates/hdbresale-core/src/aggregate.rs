//! Per-category transaction counts and price statistics.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::record::NormalizedRecord;

/// A column to group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Town,
    FlatType,
    FlatModel,
    StoreyRange,
    Year,
    Month,
    RemainingLease,
    FloorArea,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Town => "town",
            Column::FlatType => "flat_type",
            Column::FlatModel => "flat_model",
            Column::StoreyRange => "storey_range",
            Column::Year => "year",
            Column::Month => "month",
            Column::RemainingLease => "remaining_lease",
            Column::FloorArea => "floor_area_sqm",
        }
    }

    /// The record's value for this column; `None` when missing.
    pub fn key(&self, record: &NormalizedRecord) -> Option<GroupKey> {
        match self {
            Column::Town => record.town.as_deref().map(GroupKey::from),
            Column::FlatType => record.flat_type.as_deref().map(GroupKey::from),
            Column::FlatModel => record.flat_model.as_deref().map(GroupKey::from),
            Column::StoreyRange => record.storey_range.as_deref().map(GroupKey::from),
            Column::Year => Some(GroupKey::from(f64::from(record.year))),
            Column::Month => Some(GroupKey::from(record.month.as_str())),
            Column::RemainingLease => record.remaining_lease.map(|y| GroupKey::from(f64::from(y))),
            Column::FloorArea => record.floor_area_sqm.map(GroupKey::from),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown column {0:?}")]
pub struct UnknownColumn(pub String);

impl FromStr for Column {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "town" => Ok(Column::Town),
            "flat_type" => Ok(Column::FlatType),
            "flat_model" => Ok(Column::FlatModel),
            "storey_range" => Ok(Column::StoreyRange),
            "year" => Ok(Column::Year),
            "month" => Ok(Column::Month),
            "remaining_lease" => Ok(Column::RemainingLease),
            "floor_area_sqm" => Ok(Column::FloorArea),
            other => Err(UnknownColumn(other.to_string())),
        }
    }
}

/// A group value. Numbers order numerically and come before text.
#[derive(Debug, Clone)]
pub enum GroupKey {
    Number(f64),
    Text(String),
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        GroupKey::Text(value.to_string())
    }
}

impl From<f64> for GroupKey {
    fn from(value: f64) -> Self {
        GroupKey::Number(value)
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
            (GroupKey::Number(_), GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "{n}"),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

/// Statistic over the resale prices of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Median,
    Min,
    Max,
}

impl Aggregation {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }

    /// `None` for an empty slice. Sorts `prices` in place.
    fn apply(&self, prices: &mut [i64]) -> Option<f64> {
        if prices.is_empty() {
            return None;
        }
        prices.sort_unstable();
        let n = prices.len();
        let value = match self {
            Aggregation::Mean => prices.iter().map(|&p| p as f64).sum::<f64>() / n as f64,
            Aggregation::Median if n % 2 == 1 => prices[n / 2] as f64,
            Aggregation::Median => (prices[n / 2 - 1] as f64 + prices[n / 2] as f64) / 2.0,
            Aggregation::Min => prices[0] as f64,
            Aggregation::Max => prices[n - 1] as f64,
        };
        Some(value)
    }
}

#[derive(Debug, Error)]
#[error("unknown aggregation {0:?}")]
pub struct UnknownAggregation(pub String);

impl FromStr for Aggregation {
    type Err = UnknownAggregation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            other => Err(UnknownAggregation(other.to_string())),
        }
    }
}

/// Transactions per value of `column`, most frequent first (ties by key).
/// Records missing the column are not counted.
pub fn count_by<'a, I>(records: I, column: Column) -> Vec<(GroupKey, usize)>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut counts: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for record in records {
        if let Some(key) = column.key(record) {
            *counts.entry(key).or_default() += 1;
        }
    }
    let mut out: Vec<(GroupKey, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Resale price statistic per value of `column`, ordered by key.
pub fn price_by<'a, I>(records: I, column: Column, aggregation: Aggregation) -> Vec<(GroupKey, f64)>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut groups: BTreeMap<GroupKey, Vec<i64>> = BTreeMap::new();
    for record in records {
        if let Some(key) = column.key(record) {
            groups.entry(key).or_default().push(record.resale_price);
        }
    }
    groups
        .into_iter()
        .filter_map(|(key, mut prices)| aggregation.apply(&mut prices).map(|v| (key, v)))
        .collect()
}

/// Price statistic for every (row value, column value) pair.
///
/// `cells[i][j]` belongs to `rows[i]` and `columns[j]`; it is `None` when no
/// record has that combination. Both key lists are sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePivot {
    pub rows: Vec<GroupKey>,
    pub columns: Vec<GroupKey>,
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Cross-tabulate resale prices, e.g. median price per town and flat type.
/// Records missing either column are left out.
pub fn price_pivot<'a, I>(
    records: I,
    rows: Column,
    columns: Column,
    aggregation: Aggregation,
) -> PricePivot
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut groups: BTreeMap<(GroupKey, GroupKey), Vec<i64>> = BTreeMap::new();
    for record in records {
        if let (Some(r), Some(c)) = (rows.key(record), columns.key(record)) {
            groups.entry((r, c)).or_default().push(record.resale_price);
        }
    }

    let row_keys: BTreeSet<GroupKey> = groups.keys().map(|(r, _)| r.clone()).collect();
    let column_keys: BTreeSet<GroupKey> = groups.keys().map(|(_, c)| c.clone()).collect();
    let cells = row_keys
        .iter()
        .map(|r| {
            column_keys
                .iter()
                .map(|c| {
                    groups
                        .get_mut(&(r.clone(), c.clone()))
                        .and_then(|prices| aggregation.apply(prices))
                })
                .collect()
        })
        .collect();

    PricePivot {
        rows: row_keys.into_iter().collect(),
        columns: column_keys.into_iter().collect(),
        cells,
    }
}

/// Highest resale price in the selection.
pub fn highest_price<'a, I>(records: I) -> Option<i64>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    records.into_iter().map(|r| r.resale_price).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(town: &str, flat_type: &str, price: i64) -> NormalizedRecord {
        NormalizedRecord {
            month: "2015-01".into(),
            year: 2015,
            town: Some(town.into()),
            flat_type: Some(flat_type.into()),
            storey_range: None,
            floor_area_sqm: None,
            flat_model: None,
            lease_commence_date: None,
            remaining_lease: Some(70),
            resale_price: price,
            full_address: "1 X".into(),
            search_address: "1+X+SINGAPORE".into(),
        }
    }

    fn sample() -> Vec<NormalizedRecord> {
        vec![
            record("BEDOK", "4 ROOM", 400_000),
            record("BEDOK", "3 ROOM", 300_000),
            record("TAMPINES", "4 ROOM", 420_000),
            record("BEDOK", "4 ROOM", 410_000),
            record("ANG MO KIO", "3 ROOM", 280_000),
            record("TAMPINES", "5 ROOM", 500_000),
        ]
    }

    fn key(s: &str) -> GroupKey {
        GroupKey::from(s)
    }

    #[test]
    fn counts_sorted_by_frequency_then_key() {
        let counts = count_by(&sample(), Column::Town);
        assert_eq!(
            counts,
            vec![(key("BEDOK"), 3), (key("TAMPINES"), 2), (key("ANG MO KIO"), 1)]
        );
    }

    #[test]
    fn counts_skip_missing_values() {
        let mut rows = sample();
        rows[0].flat_type = None;
        let counts = count_by(&rows, Column::FlatType);
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn median_price_even_and_odd() {
        let medians = price_by(&sample(), Column::Town, Aggregation::Median);
        assert_eq!(
            medians,
            vec![
                (key("ANG MO KIO"), 280_000.0),
                (key("BEDOK"), 400_000.0),
                (key("TAMPINES"), 460_000.0),
            ]
        );
    }

    #[test]
    fn mean_min_max() {
        let rows = sample();
        let mean = price_by(&rows, Column::FlatType, Aggregation::Mean);
        assert_eq!(mean[1], (key("4 ROOM"), 410_000.0));
        let min = price_by(&rows, Column::FlatType, Aggregation::Min);
        assert_eq!(min[0], (key("3 ROOM"), 280_000.0));
        let max = price_by(&rows, Column::FlatType, Aggregation::Max);
        assert_eq!(max[2], (key("5 ROOM"), 500_000.0));
    }

    #[test]
    fn floor_area_groups_in_numeric_order() {
        let mut rows = sample();
        let areas = [45.0, 121.0, 92.0, 45.0, 100.5, 121.0];
        for (row, area) in rows.iter_mut().zip(areas) {
            row.floor_area_sqm = Some(area);
        }
        rows.push(record("YISHUN", "4 ROOM", 1));
        rows[6].floor_area_sqm = None;

        let medians = price_by(&rows, Column::FloorArea, Aggregation::Median);
        let keys: Vec<String> = medians.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["45", "92", "100.5", "121"]);
        assert_eq!(medians[0].1, 405_000.0);
    }

    #[test]
    fn pivot_town_by_flat_type() {
        let pivot = price_pivot(&sample(), Column::Town, Column::FlatType, Aggregation::Median);
        assert_eq!(pivot.rows, vec![key("ANG MO KIO"), key("BEDOK"), key("TAMPINES")]);
        assert_eq!(pivot.columns, vec![key("3 ROOM"), key("4 ROOM"), key("5 ROOM")]);
        assert_eq!(
            pivot.cells,
            vec![
                vec![Some(280_000.0), None, None],
                vec![Some(300_000.0), Some(405_000.0), None],
                vec![None, Some(420_000.0), Some(500_000.0)],
            ]
        );
    }

    #[test]
    fn pivot_of_nothing_is_empty() {
        let pivot = price_pivot(&Vec::new(), Column::Town, Column::FlatType, Aggregation::Mean);
        assert!(pivot.rows.is_empty());
        assert!(pivot.columns.is_empty());
        assert!(pivot.cells.is_empty());
    }

    #[test]
    fn numbers_sort_before_text() {
        assert!(GroupKey::from(9.0) < GroupKey::from(10.0));
        assert!(GroupKey::from(1e9) < key("A"));
        assert_eq!(GroupKey::from(2015.0).to_string(), "2015");
    }

    #[test]
    fn highest_price_of_selection() {
        assert_eq!(highest_price(&sample()), Some(500_000));
        assert_eq!(highest_price(&Vec::new()), None);
    }

    #[test]
    fn column_names_round_trip() {
        for column in [
            Column::Town,
            Column::FlatType,
            Column::StoreyRange,
            Column::Year,
            Column::FloorArea,
        ] {
            assert_eq!(column.name().parse::<Column>().unwrap(), column);
        }
        assert!("block".parse::<Column>().is_err());
    }

    #[test]
    fn aggregation_names_round_trip() {
        for agg in [
            Aggregation::Mean,
            Aggregation::Median,
            Aggregation::Min,
            Aggregation::Max,
        ] {
            assert_eq!(agg.name().parse::<Aggregation>().unwrap(), agg);
        }
        let err = "mode".parse::<Aggregation>().unwrap_err();
        assert_eq!(err.to_string(), "unknown aggregation \"mode\"");
    }
}
