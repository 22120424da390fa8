//! Loader configuration

pub mod csv_options;
pub mod null_handling;

pub use csv_options::*;
pub use null_handling::*;
