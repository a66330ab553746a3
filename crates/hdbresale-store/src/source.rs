//! Raw transaction CSVs.
//!
//! data.gov.sg publishes resale prices as several CSV files split by period,
//! all with the same header. A source is either one file or a directory of
//! them, read in file-name order and concatenated into one batch.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use hdbresale_core::{RawBatch, RawRecord};
use tracing::{debug, info};

use crate::StoreError;

/// The CSV files a source path refers to: the path itself, or every `*.csv`
/// file directly inside it, sorted by name.
pub fn csv_files(path: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(StoreError::NoCsvFiles(path.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let p = entry?.path();
        let is_csv = p
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if p.is_file() && is_csv {
            files.push(p);
        }
    }
    if files.is_empty() {
        return Err(StoreError::NoCsvFiles(path.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Read every CSV file under `path` into one batch.
///
/// All files must carry the header of the first one.
pub fn read_csv_source(path: &Path) -> Result<RawBatch, StoreError> {
    let files = csv_files(path)?;
    let mut expected: Option<(PathBuf, Vec<String>)> = None;
    let mut batch = RawBatch::default();

    for file in files {
        let (headers, part) = read_csv_with_headers(&file)?;
        match &expected {
            Some((first, first_headers)) if *first_headers != headers => {
                return Err(StoreError::HeaderMismatch {
                    path: file,
                    expected_from: first.clone(),
                });
            }
            Some(_) => {}
            None => expected = Some((file.clone(), headers)),
        }
        debug!(file = %file.display(), rows = part.len(), "read csv file");
        batch.extend(part);
    }

    info!(path = %path.display(), rows = batch.len(), "read csv source");
    Ok(batch)
}

/// Read a single CSV file.
pub fn read_csv(path: &Path) -> Result<RawBatch, StoreError> {
    read_csv_with_headers(path).map(|(_, batch)| batch)
}

fn read_csv_with_headers(path: &Path) -> Result<(Vec<String>, RawBatch), StoreError> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let fields = headers.iter().map(String::as_str).zip(row.iter());
        let record = RawRecord::from_text_fields(fields).map_err(|source| StoreError::Cell {
            path: path.to_path_buf(),
            line,
            source,
        })?;
        records.push(record);
    }

    let batch = RawBatch::new(headers.iter(), records);
    Ok((headers, batch))
}
