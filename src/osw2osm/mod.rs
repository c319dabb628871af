//! Reverse conversion: OSW archive to an OSM XML document
//!
//! The archive's nodes, edges and points members are extracted, merged into
//! one collection and encoded as OSM topology. Temporary files are removed
//! as soon as the next stage has consumed them.

pub mod archive;
pub mod encoder;
pub mod merge;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::core::{ConvertOptions, Result};

pub use archive::{unzip, MemberKind};
pub use encoder::{encode_osm, OsmDocument};
pub use merge::{merge, merged_path};

/// Path of the OSM document generated for `prefix`
pub fn osm_output_path(workdir: &Path, prefix: &str) -> PathBuf {
    workdir.join(format!("{prefix}.graph.osm.xml"))
}

/// Runs the reverse pipeline and returns the path of the written document.
///
/// Extracted members and the merged collection are removed whether or not
/// the stage consuming them succeeds.
pub fn convert(archive: &Path, workdir: &Path, options: &ConvertOptions) -> Result<PathBuf> {
    let prefix = options.prefix_for(archive);
    info!("Converting {} to OSM XML in {}", archive.display(), workdir.display());

    let members = unzip(archive, workdir)?;
    let inputs: Vec<PathBuf> = members.into_values().collect();
    let merged = merge(&inputs, workdir, &prefix).map_err(|err| {
        remove_temporary(&inputs);
        err
    })?;

    let output = osm_output_path(workdir, &prefix);
    if let Err(err) = encode_osm(&merged, &output) {
        remove_temporary(std::slice::from_ref(&merged));
        return Err(err);
    }
    fs::remove_file(&merged)?;

    info!("Wrote {}", output.display());
    Ok(output)
}

fn remove_temporary(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {e}", path.display()),
        }
    }
}
