//! The batch stages behind `prepare`, `geocode` and `combine`.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use hdbresale_core::config::{CombineConfig, EtlConfig, GeocodeConfig};
use hdbresale_core::{GeocodedRecord, RowPolicy};
use hdbresale_geocode::{BatchSink, Geocoder, RateLimiter, RunStats, geocode_batches};
use hdbresale_store::StoreError;

#[derive(Debug)]
pub struct PrepareStats {
    pub rows: usize,
    pub normalized: usize,
    pub skipped: usize,
    pub artifact: PathBuf,
    pub elapsed_secs: f64,
}

/// Read the raw CSVs, normalize them, write the normalized artifact.
pub fn prepare(config: &EtlConfig) -> anyhow::Result<PrepareStats> {
    let start = Instant::now();

    let raw = hdbresale_store::read_csv_source(&config.csv_path)
        .with_context(|| format!("reading {}", config.csv_path.display()))?;
    eprintln!("  Read {} rows from {}", raw.len(), config.csv_path.display());

    let normalized = hdbresale_core::normalize(&raw, config.row_policy)?;
    let artifact = config.artifact_path();
    if normalized.records.is_empty() {
        anyhow::bail!("no rows to write to {}", artifact.display());
    }
    hdbresale_store::write_normalized(&artifact, &normalized.records)
        .with_context(|| format!("writing {}", artifact.display()))?;

    Ok(PrepareStats {
        rows: raw.len(),
        normalized: normalized.records.len(),
        skipped: normalized.skipped.len(),
        artifact,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

/// Writes each geocoded batch to its own part file. A batch is done only
/// when its part file is a readable Parquet file.
pub struct ParquetPartSink {
    dir: PathBuf,
}

impl ParquetPartSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BatchSink for ParquetPartSink {
    type Error = StoreError;

    fn exists(&self, index: usize) -> bool {
        hdbresale_store::is_complete_parquet(&hdbresale_store::part_path(&self.dir, index))
    }

    fn write(&mut self, index: usize, records: &[GeocodedRecord]) -> Result<(), StoreError> {
        hdbresale_store::write_geocoded(&hdbresale_store::part_path(&self.dir, index), records)
    }
}

/// Normalize the geocoding CSV and geocode it into part files.
pub async fn geocode<G>(
    config: &GeocodeConfig,
    policy: RowPolicy,
    geocoder: &G,
) -> anyhow::Result<RunStats>
where
    G: Geocoder + ?Sized,
{
    let raw = hdbresale_store::read_csv_source(&config.csv_path)
        .with_context(|| format!("reading {}", config.csv_path.display()))?;
    let normalized = hdbresale_core::normalize(&raw, policy)?;
    eprintln!(
        "  Geocoding {} rows in batches of {} into {}",
        normalized.records.len(),
        config.batch_size,
        config.artifacts_path.display()
    );

    let mut limiter = RateLimiter::new(config.min_delay());
    let mut sink = ParquetPartSink::new(&config.artifacts_path);
    let stats = geocode_batches(
        &normalized.records,
        geocoder,
        &mut limiter,
        config.batch_size,
        &mut sink,
    )
    .await?;
    Ok(stats)
}

/// Concatenate the geocoded part files into one artifact.
///
/// Returns the row count and the artifact path.
pub fn combine(config: &CombineConfig) -> anyhow::Result<(usize, PathBuf)> {
    let out = config.artifact_path();
    let rows = hdbresale_store::combine_parts(&config.geocode_files_path, &out).with_context(|| {
        format!("combining parts in {}", config.geocode_files_path.display())
    })?;
    Ok((rows, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdbresale_core::Coordinates;
    use hdbresale_geocode::GeocodeError;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const CSV: &str = "\
month,town,flat_type,block,street_name,storey_range,floor_area_sqm,flat_model,lease_commence_date,resale_price
2015-01,BEDOK,4 ROOM,10,BEDOK NTH RD,01 TO 03,92,Model A,1985,400000
2015-02,CLEMENTI,MULTI GENERATION,312,CLEMENTI AVE 4,04 TO 06,150,Multi Generation,1987,640000
2016-03,TAMPINES,5 ROOM,201,TAMPINES ST 21,07 TO 09,121,Improved,1990,520000
";

    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Geocoder for CountingGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Coordinates {
                latitude: 1.33,
                longitude: 103.9,
            }))
        }
    }

    fn write_csv(dir: &Path) -> PathBuf {
        let path = dir.join("resale.csv");
        std::fs::write(&path, CSV).unwrap();
        path
    }

    #[test]
    fn prepare_writes_normalized_artifact() {
        let tmp = TempDir::new().unwrap();
        let config = EtlConfig {
            csv_path: write_csv(tmp.path()),
            artifacts_path: tmp.path().join("artifacts"),
            artifact_file: "hdb_resale.parquet".into(),
            row_policy: RowPolicy::Abort,
        };

        let stats = prepare(&config).unwrap();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.normalized, 3);
        assert_eq!(stats.skipped, 0);

        let records = hdbresale_store::read_records(&stats.artifact).unwrap();
        assert_eq!(records[1].record.flat_type.as_deref(), Some("MULTI-GENERATION"));
        assert_eq!(records[1].record.remaining_lease, Some(71));
        assert_eq!(records[2].record.year, 2016);
    }

    #[test]
    fn prepare_rejects_unrelated_csv() {
        let tmp = TempDir::new().unwrap();
        let csv = tmp.path().join("other.csv");
        std::fs::write(&csv, "id,name\n1,a\n").unwrap();
        let config = EtlConfig {
            csv_path: csv,
            artifacts_path: tmp.path().join("artifacts"),
            ..EtlConfig::default()
        };
        let err = prepare(&config).unwrap_err();
        assert!(err.to_string().contains("column"));
    }

    #[tokio::test]
    async fn geocode_resumes_and_combines() {
        let tmp = TempDir::new().unwrap();
        let parts = tmp.path().join("geocode");
        let config = GeocodeConfig {
            csv_path: write_csv(tmp.path()),
            batch_size: 2,
            artifacts_path: parts.clone(),
            min_delay_ms: 100,
            ..GeocodeConfig::default()
        };
        let geocoder = CountingGeocoder {
            calls: AtomicUsize::new(0),
        };

        let first = geocode(&config, RowPolicy::Abort, &geocoder).await.unwrap();
        assert_eq!(first.batches_written, 2);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);

        let second = geocode(&config, RowPolicy::Abort, &geocoder).await.unwrap();
        assert_eq!(second.batches_skipped, 2);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);

        let combine_config = CombineConfig {
            geocode_files_path: parts,
            artifacts_path: tmp.path().join("artifacts"),
            artifact_file: "2015_geocoded.parquet".into(),
        };
        let (rows, out) = combine(&combine_config).unwrap();
        assert_eq!(rows, 3);
        let records = hdbresale_store::read_records(&out).unwrap();
        assert!(records.iter().all(|r| r.location.is_some()));
    }

    #[test]
    fn part_sink_sees_only_complete_parts() {
        let tmp = TempDir::new().unwrap();
        let mut sink = ParquetPartSink::new(tmp.path());
        assert!(!sink.exists(0));

        std::fs::write(hdbresale_store::part_path(tmp.path(), 0), b"").unwrap();
        assert!(!sink.exists(0));

        let record = GeocodedRecord {
            record: hdbresale_core::normalize_record(&hdbresale_core::RawRecord {
                month: Some("2015-01".into()),
                block: Some("10".into()),
                street_name: Some("BEDOK NTH RD".into()),
                resale_price: Some(hdbresale_core::PriceValue::Integer(400_000)),
                ..Default::default()
            })
            .unwrap(),
            location: None,
        };
        sink.write(0, &[record]).unwrap();
        assert!(sink.exists(0));
        assert!(!sink.exists(1));
    }

    #[tokio::test]
    async fn truncated_part_is_geocoded_again() {
        let tmp = TempDir::new().unwrap();
        let parts = tmp.path().join("geocode");
        std::fs::create_dir_all(&parts).unwrap();
        std::fs::write(hdbresale_store::part_path(&parts, 0), b"PAR1\0\0").unwrap();
        let config = GeocodeConfig {
            csv_path: write_csv(tmp.path()),
            batch_size: 1,
            artifacts_path: parts.clone(),
            min_delay_ms: 100,
            ..GeocodeConfig::default()
        };
        let geocoder = CountingGeocoder {
            calls: AtomicUsize::new(0),
        };

        let stats = geocode(&config, RowPolicy::Abort, &geocoder).await.unwrap();
        assert_eq!(stats.batches_skipped, 0);
        assert_eq!(stats.batches_written, 3);

        let combine_config = CombineConfig {
            geocode_files_path: parts,
            artifacts_path: tmp.path().join("artifacts"),
            artifact_file: "2015_geocoded.parquet".into(),
        };
        let (rows, _) = combine(&combine_config).unwrap();
        assert_eq!(rows, 3);
    }
}
