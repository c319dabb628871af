//! Entity sources: where raw OSM entities come from

use std::path::Path;

use crate::core::{Error, Result};

use super::entity::RawEntity;
use super::pbf::PbfSource;
use super::xml::XmlSource;

/// A re-readable stream of raw entities.
///
/// Every call to [`EntitySource::for_each_entity`] is one full pass over the
/// source, in nodes, ways, areas order.
pub trait EntitySource {
    fn for_each_entity(&self, visitor: &mut dyn FnMut(&RawEntity)) -> Result<()>;
}

impl EntitySource for [RawEntity] {
    fn for_each_entity(&self, visitor: &mut dyn FnMut(&RawEntity)) -> Result<()> {
        for entity in self {
            visitor(entity);
        }
        Ok(())
    }
}

impl EntitySource for Vec<RawEntity> {
    fn for_each_entity(&self, visitor: &mut dyn FnMut(&RawEntity)) -> Result<()> {
        self.as_slice().for_each_entity(visitor)
    }
}

/// Opens a file-backed source, choosing the decoder from the file extension
pub fn open_source(path: &Path) -> Result<Box<dyn EntitySource>> {
    if !path.is_file() {
        return Err(Error::InputUnreadable(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".pbf") {
        Ok(Box::new(PbfSource::new(path)))
    } else if name.ends_with(".osm") || name.ends_with(".xml") {
        Ok(Box::new(XmlSource::new(path)))
    } else {
        Err(Error::InputUnreadable(format!(
            "{}: unsupported format, expected .osm.pbf or .osm",
            path.display()
        )))
    }
}
