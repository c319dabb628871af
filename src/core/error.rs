//! Error types for the osm-osw-reformatter library
//!
//! Every stage of a conversion reports failures through [`Error`]. The
//! conversion boundary turns them into a failed [`crate::Response`], except
//! for internal errors which are returned to the caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for conversion operations
#[derive(Debug, Error)]
pub enum Error {
    /// The source extract is missing, unsupported or corrupt
    #[error("Input unreadable: {0}")]
    InputUnreadable(String),

    /// Geometry construction referenced a node that was never ingested
    #[error("Referential integrity error: {0}")]
    ReferentialIntegrity(String),

    /// A tag set matches no classification recognized for its kind
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// An OSW archive holds none of the nodes, edges or points members
    #[error("Archive contains none of the recognized members (nodes, edges, points)")]
    ArchiveMembershipEmpty,

    /// An output file could not be written
    #[error("Failed to write {}: {source}", path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A GeoJSON document does not have the expected structure
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    /// Encoding was requested for an element without geometry
    #[error("Missing geometry: {0}")]
    MissingGeometry(String),

    /// Ring or sequence data that cannot form a geometry
    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),
}

impl Error {
    /// Internal errors escape the conversion boundary instead of becoming a
    /// failed response.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::MalformedGeometry(_))
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::IoWrite {
            path: path.into(),
            source,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io_err) => Error::IoError(io_err),
            other => Error::InputUnreadable(format!("invalid archive: {other}")),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::InputUnreadable(format!("invalid OSM XML: {err}"))
    }
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, Error>;
