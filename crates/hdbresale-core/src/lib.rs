pub mod address;
pub mod aggregate;
pub mod columnar;
pub mod config;
pub mod derive;
pub mod error;
pub mod lease;
pub mod normalize;
pub mod record;
pub mod schema;
pub mod slice;

pub use config::{Config, ConfigError};
pub use error::{CellError, FieldError, NormalizeError, RowError};
pub use normalize::{Normalized, REQUIRED_COLUMNS, RowPolicy, normalize, normalize_record};
pub use record::{
    Coordinates, GeocodedRecord, LeaseValue, NormalizedRecord, PriceValue, RawBatch, RawRecord,
};
pub use schema::resale;
