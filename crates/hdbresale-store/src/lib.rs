//! Storage layer: raw CSV source, Parquet artifacts, artifact cache.

mod error;
pub use error::StoreError;

pub mod artifact;
pub mod cache;
pub mod source;

pub use artifact::{
    combine_parts, is_complete_parquet, part_files, part_path, read_parquet, read_records,
    write_geocoded, write_normalized, write_parquet,
};
pub use cache::ArtifactCache;
pub use source::{csv_files, read_csv, read_csv_source};
