//! # osm-osw-reformatter
//!
//! Converts OpenStreetMap extracts into OpenSidewalks (OSW) GeoJSON
//! collections, and OSW archives back into OSM XML.
//!
//! ## Features
//!
//! - **Streaming ingestion**: `.osm.pbf` and `.osm` extracts are read pass by pass
//! - **Graph simplification**: ways split at every vertex are merged back
//! - **OSW normalization**: sidewalks, crossings, kerbs and street furniture
//! - **Round trip**: OSW archives are rebuilt into OSM topology
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use osm_osw_reformatter::Formatter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut formatter = Formatter::new("output", "wa.microsoft.osm.pbf")?;
//! let response = formatter.osm2osw()?;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Progress Tracking
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use osm_osw_reformatter::{ConvertOptions, Formatter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ConvertOptions {
//!     progress: Some(Arc::new(|kind, visited, total| {
//!         println!("{kind}: {visited}/{total}");
//!     })),
//!     ..Default::default()
//! };
//! let mut formatter = Formatter::new("output", "wa.osm.pbf")?.with_options(options);
//! formatter.osm2osw()?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::error;

pub mod core;
pub mod graph;
pub mod normalize;
pub mod osm;
pub mod osm2osw;
pub mod osw2osm;

pub use crate::core::{ConvertOptions, Error, GeneratedFiles, OutputPaths, ProgressCallback, Response, Result};
pub use crate::graph::{EdgeKey, FeatureKey, GraphEdge, GraphNode, NodeKind, OsmGraph};
pub use crate::normalize::FeatureKind;

/// Maps a conversion result onto a [`Response`].
///
/// Stage failures become a failed response; internal errors are returned.
fn respond<T>(result: Result<T>, files: impl FnOnce(T) -> GeneratedFiles) -> Result<Response> {
    match result {
        Ok(value) => Ok(Response::success(files(value))),
        Err(err) if err.is_internal() => Err(err),
        Err(err) => {
            error!("Conversion failed: {err}");
            Ok(Response::failure(&err))
        }
    }
}

/// One input file and the working directory its conversions write to
pub struct Formatter {
    workdir: PathBuf,
    file_path: PathBuf,
    options: ConvertOptions,
    generated: Vec<PathBuf>,
}

impl Formatter {
    /// Creates the working directory if needed
    pub fn new(workdir: impl AsRef<Path>, file_path: impl AsRef<Path>) -> Result<Self> {
        let workdir = workdir.as_ref().to_path_buf();
        fs::create_dir_all(&workdir).map_err(|e| Error::write(&workdir, e))?;
        Ok(Self {
            workdir,
            file_path: file_path.as_ref().to_path_buf(),
            options: ConvertOptions::default(),
            generated: Vec::new(),
        })
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Converts the OSM extract into OSW GeoJSON collections
    pub fn osm2osw(&mut self) -> Result<Response> {
        let result = osm2osw::convert(&self.file_path, &self.workdir, &self.options);
        let response = respond(result, GeneratedFiles::Many)?;
        self.generated.extend(response.paths());
        Ok(response)
    }

    /// Converts the OSW archive into an OSM XML document
    pub fn osw2osm(&mut self) -> Result<Response> {
        let result = osw2osm::convert(&self.file_path, &self.workdir, &self.options);
        let response = respond(result, GeneratedFiles::Single)?;
        self.generated.extend(response.paths());
        Ok(response)
    }

    /// Removes every file generated by this formatter
    pub fn cleanup(&mut self) -> Result<()> {
        for path in self.generated.drain(..) {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Converts `input` into OSW collections under `workdir`
pub fn osm2osw(input: impl AsRef<Path>, workdir: impl AsRef<Path>) -> Result<Response> {
    Formatter::new(workdir, input)?.osm2osw()
}

/// Converts the OSW archive `archive` into an OSM document under `workdir`
pub fn osw2osm(archive: impl AsRef<Path>, workdir: impl AsRef<Path>) -> Result<Response> {
    Formatter::new(workdir, archive)?.osw2osm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_formatter_creates_workdir() {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("nested/out");
        let formatter = Formatter::new(&workdir, "input.osm.pbf").unwrap();
        assert!(workdir.is_dir());
        assert_eq!(formatter.workdir(), workdir.as_path());
    }

    #[test]
    fn test_missing_input_is_failed_response() {
        let dir = TempDir::new().unwrap();
        let response = osm2osw(dir.path().join("absent.osm.pbf"), dir.path()).unwrap();
        assert!(!response.status);
        assert!(response.generated_files.is_none());
        assert!(response.error.unwrap().contains("Input unreadable"));
    }

    #[test]
    fn test_internal_errors_escape_the_boundary() {
        let result: Result<Response> = respond(Err(Error::MalformedGeometry("ring".to_string())), |()| {
            GeneratedFiles::Many(Vec::new())
        });
        assert!(result.is_err());

        let response = respond(Err(Error::SchemaValidation("x".to_string())), |()| {
            GeneratedFiles::Many(Vec::new())
        })
        .unwrap();
        assert!(!response.status);
    }
}
