//! Batched geocoding with resumable output.
//!
//! Records are split into fixed-size batches. Each batch is geocoded one
//! query at a time through the [`RateLimiter`] and handed to a [`BatchSink`]
//! before the next batch starts, so an interrupted run loses at most one
//! batch. Batches the sink already holds are skipped on the next run.

use hdbresale_core::{GeocodedRecord, NormalizedRecord};
use tracing::{info, warn};

use crate::{Geocoder, RateLimiter};

/// Destination for finished batches, addressed by batch index.
pub trait BatchSink {
    type Error;

    /// Whether batch `index` was already written by an earlier run.
    fn exists(&self, index: usize) -> bool;

    fn write(&mut self, index: usize, records: &[GeocodedRecord]) -> Result<(), Self::Error>;
}

/// Counters for one [`geocode_batches`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub batches_written: usize,
    pub batches_skipped: usize,
    pub located: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Geocode `records` by `search_address` in batches of `batch_size`.
///
/// A lookup that errors is logged and leaves the record without a location;
/// only sink errors stop the run.
pub async fn geocode_batches<G, S>(
    records: &[NormalizedRecord],
    geocoder: &G,
    limiter: &mut RateLimiter,
    batch_size: usize,
    sink: &mut S,
) -> Result<RunStats, S::Error>
where
    G: Geocoder + ?Sized,
    S: BatchSink,
{
    let batch_size = batch_size.max(1);
    let total = records.len().div_ceil(batch_size);
    let mut stats = RunStats::default();

    for (index, chunk) in records.chunks(batch_size).enumerate() {
        if sink.exists(index) {
            info!(batch = index, total, "batch already geocoded, skipping");
            stats.batches_skipped += 1;
            continue;
        }

        let mut out = Vec::with_capacity(chunk.len());
        for record in chunk {
            limiter.wait().await;
            let location = match geocoder.geocode(&record.search_address).await {
                Ok(Some(coords)) => {
                    stats.located += 1;
                    Some(coords)
                }
                Ok(None) => {
                    stats.not_found += 1;
                    None
                }
                Err(e) => {
                    warn!(address = %record.search_address, error = %e, "geocoding failed");
                    stats.failed += 1;
                    None
                }
            };
            out.push(GeocodedRecord {
                record: record.clone(),
                location,
            });
        }

        sink.write(index, &out)?;
        stats.batches_written += 1;
        info!(batch = index, total, rows = out.len(), "geocoded batch");
    }

    Ok(stats)
}
