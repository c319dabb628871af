//! Conversion options and output path resolution

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::normalize::FeatureKind;

/// Progress callback type: `(kind, visited, total)` for every visited raw entity
pub type ProgressCallback = Arc<dyn Fn(FeatureKind, u64, u64) + Send + Sync>;

/// Options shared by both conversion directions
#[derive(Clone, Default)]
pub struct ConvertOptions {
    /// Optional progress callback, notified during the parse passes
    pub progress: Option<ProgressCallback>,

    /// File name prefix for generated files; derived from the input when unset
    pub prefix: Option<String>,
}

impl ConvertOptions {
    /// Prefix for files generated from `input`
    pub fn prefix_for(&self, input: &Path) -> String {
        self.prefix
            .clone()
            .unwrap_or_else(|| derive_prefix(input))
    }
}

/// Extensions stripped from an input file name when deriving a prefix
const KNOWN_EXTENSIONS: &[&str] = &[".pbf", ".osm", ".xml", ".zip", ".gz"];

/// Derives an output prefix from an input path: `wa.microsoft.osm.pbf` becomes `wa.microsoft`
pub fn derive_prefix(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    while let Some(ext) = KNOWN_EXTENSIONS.iter().find(|ext| name.ends_with(*ext)) {
        name.truncate(name.len() - ext.len());
    }

    if name.is_empty() {
        "output".to_string()
    } else {
        name
    }
}

/// Paths of the six forward output collections
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub nodes: PathBuf,
    pub edges: PathBuf,
    pub points: PathBuf,
    pub lines: PathBuf,
    pub zones: PathBuf,
    pub polygons: PathBuf,
}

impl OutputPaths {
    /// `{workdir}/{prefix}.graph.{kind}.geojson` for every kind
    pub fn in_dir(workdir: &Path, prefix: &str) -> Self {
        let path = |kind: &str| workdir.join(format!("{prefix}.graph.{kind}.geojson"));
        Self {
            nodes: path("nodes"),
            edges: path("edges"),
            points: path("points"),
            lines: path("lines"),
            zones: path("zones"),
            polygons: path("polygons"),
        }
    }
}
