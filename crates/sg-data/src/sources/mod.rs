//! Loaders that build in-memory tables

pub mod arrow_source;
pub mod csv_source;

pub use arrow_source::{from_record_batch, schema_from_arrow};
pub use csv_source::{load_csv, load_csv_async, parse_field, read_csv};
