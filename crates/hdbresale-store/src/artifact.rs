//! Parquet artifacts: the normalized dataset and geocoded part files.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use hdbresale_core::columnar;
use hdbresale_core::{GeocodedRecord, NormalizedRecord};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::StoreError;

const PART_PREFIX: &str = "part_";
const PARQUET_EXT: &str = "parquet";

/// Write batches to a Parquet file, creating parent directories.
///
/// All batches must share the first batch's schema. The file is written
/// next to `path` with a `.tmp` suffix and renamed into place once closed,
/// so `path` never holds a partial file.
pub fn write_parquet(path: &Path, batches: &[RecordBatch]) -> Result<(), StoreError> {
    let first = batches
        .first()
        .ok_or_else(|| StoreError::Other("no record batches provided".into()))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let file = File::create(&tmp)?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    std::fs::rename(&tmp, path)?;

    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    info!(path = %path.display(), rows, "wrote parquet artifact");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Whether `path` is a Parquet file whose footer can be read.
pub fn is_complete_parquet(path: &Path) -> bool {
    File::open(path)
        .ok()
        .and_then(|file| ParquetRecordBatchReaderBuilder::try_new(file).ok())
        .is_some()
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::ParquetNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Persist a normalized dataset.
pub fn write_normalized(path: &Path, records: &[NormalizedRecord]) -> Result<(), StoreError> {
    let batch = columnar::normalized_to_batch(records)?;
    write_parquet(path, &[batch])
}

/// Persist geocoded records.
pub fn write_geocoded(path: &Path, records: &[GeocodedRecord]) -> Result<(), StoreError> {
    let batch = columnar::geocoded_to_batch(records)?;
    write_parquet(path, &[batch])
}

/// Load a normalized or geocoded artifact as records.
pub fn read_records(path: &Path) -> Result<Vec<GeocodedRecord>, StoreError> {
    let mut records = Vec::new();
    for batch in read_parquet(path)? {
        records.extend(columnar::geocoded_from_batch(&batch)?);
    }
    Ok(records)
}

// ── Part files ──

/// Path of the `index`-th geocoding part file in `dir`.
pub fn part_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{PART_PREFIX}{index:05}.{PARQUET_EXT}"))
}

/// Part files in `dir`, in index order.
pub fn part_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut parts = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_part = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(PART_PREFIX) && n.ends_with(PARQUET_EXT));
        if is_part && path.is_file() {
            parts.push(path);
        }
    }
    parts.sort();
    Ok(parts)
}

/// Concatenate every part file in `dir` into one artifact at `out`.
///
/// Returns the number of rows written.
pub fn combine_parts(dir: &Path, out: &Path) -> Result<usize, StoreError> {
    let parts = part_files(dir)?;
    if parts.is_empty() {
        return Err(StoreError::NoParts(dir.to_path_buf()));
    }

    let mut batches = Vec::new();
    for part in &parts {
        batches.extend(read_parquet(part)?);
    }
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    write_parquet(out, &batches)?;

    info!(parts = parts.len(), rows, out = %out.display(), "combined part files");
    Ok(rows)
}
