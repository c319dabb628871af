//! Core library modules for osm-osw-reformatter
//!
//! Errors, conversion options and the result value shared by both directions.

pub mod config;
pub mod error;
pub mod response;

pub use config::{derive_prefix, ConvertOptions, OutputPaths, ProgressCallback};
pub use error::{Error, Result};
pub use response::{GeneratedFiles, Response};
