//! Union of several FeatureCollections into one file

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::Result;
use crate::graph::{read_feature_collection, write_feature_collection};

/// Path of the merged collection for `prefix` under `dir`
pub fn merged_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}.graph.all.geojson"))
}

/// Concatenates the features of every input into one collection.
///
/// The merged collection is written to [`merged_path`]; the inputs are
/// deleted only once that write has succeeded.
pub fn merge(paths: &[PathBuf], output_dir: &Path, prefix: &str) -> Result<PathBuf> {
    let mut features = Vec::new();
    for path in paths {
        let collection = read_feature_collection(path)?;
        debug!("Merging {} features from {}", collection.len(), path.display());
        features.extend(collection);
    }

    let output = merged_path(output_dir, prefix);
    let total = features.len();
    write_feature_collection(&output, features)?;

    for path in paths {
        fs::remove_file(path)?;
    }

    info!("Merged {} collections into {} ({total} features)", paths.len(), output.display());
    Ok(output)
}
