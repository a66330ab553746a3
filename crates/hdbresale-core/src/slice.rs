//! Row selection used by the dashboard views.

use std::collections::HashSet;

use crate::record::{Coordinates, GeocodedRecord, NormalizedRecord};

/// Open year interval: keeps `start < year < end`.
///
/// Both bounds are exclusive, so selecting 2015..2017 keeps only 2016.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        year > self.start && year < self.end
    }
}

/// Records whose year lies strictly inside `range`.
pub fn slice_year_range(records: &[NormalizedRecord], range: YearRange) -> Vec<&NormalizedRecord> {
    records.iter().filter(|r| range.contains(r.year)).collect()
}

/// Membership filter on flat type, town and flat model.
///
/// Each non-empty set must contain the record's value. With all three sets
/// empty the filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFilter {
    pub flat_types: HashSet<String>,
    pub towns: HashSet<String>,
    pub flat_models: HashSet<String>,
}

impl FeatureFilter {
    pub fn is_empty(&self) -> bool {
        self.flat_types.is_empty() && self.towns.is_empty() && self.flat_models.is_empty()
    }

    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        if self.is_empty() {
            return true;
        }
        member(&self.flat_types, record.flat_type.as_deref())
            && member(&self.towns, record.town.as_deref())
            && member(&self.flat_models, record.flat_model.as_deref())
    }

    pub fn apply<'a>(&self, records: &[&'a NormalizedRecord]) -> Vec<&'a NormalizedRecord> {
        records.iter().copied().filter(|r| self.matches(r)).collect()
    }
}

fn member(set: &HashSet<String>, value: Option<&str>) -> bool {
    set.is_empty() || value.is_some_and(|v| set.contains(v))
}

/// Rough bounding box of Singapore; geocoder answers outside it are wrong matches.
pub fn within_singapore(coords: &Coordinates) -> bool {
    coords.latitude > 1.0
        && coords.latitude < 1.5
        && coords.longitude > 101.0
        && coords.longitude < 106.0
}

/// Geocoded records with coordinates inside Singapore.
pub fn singapore_locations(records: &[GeocodedRecord]) -> Vec<&GeocodedRecord> {
    records
        .iter()
        .filter(|r| r.location.as_ref().is_some_and(within_singapore))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, town: &str, flat_type: &str, model: &str) -> NormalizedRecord {
        NormalizedRecord {
            month: format!("{year}-01"),
            year,
            town: Some(town.into()),
            flat_type: Some(flat_type.into()),
            storey_range: None,
            floor_area_sqm: None,
            flat_model: Some(model.into()),
            lease_commence_date: None,
            remaining_lease: None,
            resale_price: 300_000,
            full_address: "1 X".into(),
            search_address: "1+X+SINGAPORE".into(),
        }
    }

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn year_range_excludes_both_bounds() {
        let records: Vec<_> = (2014..=2018)
            .map(|y| record(y, "BEDOK", "4 ROOM", "Model A"))
            .collect();
        let years: Vec<i32> = slice_year_range(&records, YearRange::new(2015, 2017))
            .iter()
            .map(|r| r.year)
            .collect();
        assert_eq!(years, vec![2016]);
    }

    #[test]
    fn year_range_equal_bounds_is_empty() {
        let records = vec![record(2015, "BEDOK", "4 ROOM", "Model A")];
        assert!(slice_year_range(&records, YearRange::new(2015, 2015)).is_empty());
    }

    #[test]
    fn empty_filter_keeps_all() {
        let a = record(2015, "BEDOK", "4 ROOM", "Model A");
        let rows = vec![&a];
        assert_eq!(FeatureFilter::default().apply(&rows).len(), 1);
    }

    #[test]
    fn filter_requires_each_non_empty_set() {
        let a = record(2015, "BEDOK", "4 ROOM", "Model A");
        let b = record(2015, "BEDOK", "5 ROOM", "Improved");
        let c = record(2015, "TAMPINES", "4 ROOM", "Model A");
        let rows = vec![&a, &b, &c];

        let filter = FeatureFilter {
            flat_types: set(&["4 ROOM"]),
            towns: set(&["BEDOK"]),
            flat_models: HashSet::new(),
        };
        let kept = filter.apply(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].town.as_deref(), Some("BEDOK"));
        assert_eq!(kept[0].flat_type.as_deref(), Some("4 ROOM"));
    }

    #[test]
    fn filter_rejects_missing_value() {
        let mut a = record(2015, "BEDOK", "4 ROOM", "Model A");
        a.town = None;
        let filter = FeatureFilter {
            towns: set(&["BEDOK"]),
            ..Default::default()
        };
        assert!(!filter.matches(&a));
    }

    #[test]
    fn singapore_box() {
        assert!(within_singapore(&Coordinates {
            latitude: 1.35,
            longitude: 103.82
        }));
        assert!(!within_singapore(&Coordinates {
            latitude: 51.5,
            longitude: -0.12
        }));
        assert!(!within_singapore(&Coordinates {
            latitude: 1.5,
            longitude: 103.8
        }));
    }

    #[test]
    fn singapore_locations_drop_missing_and_outside() {
        let base = record(2015, "BEDOK", "4 ROOM", "Model A");
        let rows = vec![
            GeocodedRecord {
                record: base.clone(),
                location: Some(Coordinates {
                    latitude: 1.33,
                    longitude: 103.93,
                }),
            },
            GeocodedRecord {
                record: base.clone(),
                location: None,
            },
            GeocodedRecord {
                record: base,
                location: Some(Coordinates {
                    latitude: 40.7,
                    longitude: -74.0,
                }),
            },
        ];
        assert_eq!(singapore_locations(&rows).len(), 1);
    }
}
