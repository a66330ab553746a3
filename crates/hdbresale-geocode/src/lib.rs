//! Geocoding of search addresses: the [`Geocoder`] seam, request spacing,
//! and the batch runner that persists each batch before starting the next.

mod error;
pub use error::GeocodeError;

pub mod limiter;
pub mod runner;

#[cfg(feature = "http")]
pub mod http;

pub use limiter::RateLimiter;
pub use runner::{BatchSink, RunStats, geocode_batches};

#[cfg(feature = "http")]
pub use http::NominatimClient;

use async_trait::async_trait;
use hdbresale_core::Coordinates;

/// Resolves an address query to coordinates.
///
/// `Ok(None)` means the service had no match.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}
