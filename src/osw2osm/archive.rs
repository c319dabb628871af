//! OSW archive extraction

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use zip::ZipArchive;

use crate::core::{Error, Result};

/// Archive members the reverse conversion reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberKind {
    Nodes,
    Edges,
    Points,
}

impl MemberKind {
    pub fn name(self) -> &'static str {
        match self {
            MemberKind::Nodes => "nodes",
            MemberKind::Edges => "edges",
            MemberKind::Points => "points",
        }
    }

    /// Recognizes `wa.graph.nodes.geojson`, `edges.geojson.gz`, `points` and the like.
    ///
    /// Returns the kind and whether the member is gzip-compressed.
    pub fn from_member_name(name: &str) -> Option<(Self, bool)> {
        let file_name = name.rsplit('/').next().unwrap_or(name);
        let (file_name, gzipped) = match file_name.strip_suffix(".gz") {
            Some(stripped) => (stripped, true),
            None => (file_name, false),
        };
        let stem = file_name
            .strip_suffix(".geojson")
            .or_else(|| file_name.strip_suffix(".json"))
            .unwrap_or(file_name);

        let kind = match stem.rsplit('.').next()? {
            "nodes" => MemberKind::Nodes,
            "edges" => MemberKind::Edges,
            "points" => MemberKind::Points,
            _ => return None,
        };
        Some((kind, gzipped))
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extracts the nodes, edges and points members of `archive` into `dir`.
///
/// Each recognized member lands at `dir/{kind}.geojson`, decompressed when
/// needed. An archive without any recognized member yields an empty map.
pub fn unzip(archive: &Path, dir: &Path) -> Result<BTreeMap<MemberKind, PathBuf>> {
    match extract_members(archive, dir) {
        Err(Error::ArchiveMembershipEmpty) => {
            warn!(
                "{} contains none of the nodes, edges or points members",
                archive.display()
            );
            Ok(BTreeMap::new())
        }
        other => other,
    }
}

fn extract_members(archive: &Path, dir: &Path) -> Result<BTreeMap<MemberKind, PathBuf>> {
    let file = File::open(archive).map_err(|e| Error::InputUnreadable(format!("{}: {e}", archive.display())))?;
    let mut zip = ZipArchive::new(file)?;
    let mut extracted = BTreeMap::new();

    for index in 0..zip.len() {
        let mut member = zip.by_index(index)?;
        let name = member.name().to_string();
        if member.is_dir() || name.starts_with("__MACOSX") || name.contains("/__MACOSX") {
            continue;
        }

        let Some((kind, gzipped)) = MemberKind::from_member_name(&name) else {
            debug!("Ignoring archive member {name}");
            continue;
        };

        let target = dir.join(format!("{kind}.geojson"));
        if gzipped {
            copy_member(&mut GzDecoder::new(&mut member), &target)?;
        } else {
            copy_member(&mut member, &target)?;
        }

        if extracted.insert(kind, target).is_some() {
            warn!("Archive holds more than one {kind} member, keeping {name}");
        }
    }

    if extracted.is_empty() {
        return Err(Error::ArchiveMembershipEmpty);
    }
    info!("Extracted {} members from {}", extracted.len(), archive.display());
    Ok(extracted)
}

fn copy_member(reader: &mut dyn Read, target: &Path) -> Result<()> {
    let file = File::create(target).map_err(|e| Error::write(target, e))?;
    let mut writer = BufWriter::new(file);
    io::copy(reader, &mut writer).map_err(|e| Error::write(target, e))?;
    writer.flush().map_err(|e| Error::write(target, e))
}
