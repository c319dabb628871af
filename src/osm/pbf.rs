//! OSM PBF entity source

use std::path::{Path, PathBuf};

use osmpbf::{Element, ElementReader, RelMemberType};

use crate::core::{Error, Result};

use super::area::{AreaAssembler, WayMember};
use super::entity::{Location, RawEntity, RawNode, Tags};
use super::source::EntitySource;

/// Reads raw entities from an `.osm.pbf` file, one full file read per pass
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn unreadable(&self, err: osmpbf::Error) -> Error {
        Error::InputUnreadable(format!("{}: {err}", self.path.display()))
    }
}

fn collect_tags<'a>(tags: impl Iterator<Item = (&'a str, &'a str)>) -> Tags {
    tags.map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

impl EntitySource for PbfSource {
    fn for_each_entity(&self, visitor: &mut dyn FnMut(&RawEntity)) -> Result<()> {
        let reader = ElementReader::from_path(&self.path).map_err(|e| self.unreadable(e))?;
        let mut assembler = AreaAssembler::new();

        reader
            .for_each(|element| {
                let (id, lon, lat, tags) = match element {
                    Element::Node(node) => (node.id(), node.lon(), node.lat(), collect_tags(node.tags())),
                    Element::DenseNode(node) => (node.id(), node.lon(), node.lat(), collect_tags(node.tags())),
                    Element::Way(way) => {
                        let (way, area) = assembler.way(way.id(), way.refs().collect(), collect_tags(way.tags()));
                        visitor(&way);
                        if let Some(area) = area {
                            visitor(&area);
                        }
                        return;
                    }
                    Element::Relation(relation) => {
                        let members: Vec<WayMember> = relation
                            .members()
                            .filter(|member| matches!(member.member_type, RelMemberType::Way))
                            .map(|member| WayMember {
                                way_id: member.member_id,
                                role: member.role().unwrap_or("").to_string(),
                            })
                            .collect();
                        if let Some(area) = assembler.relation(relation.id(), &members, collect_tags(relation.tags())) {
                            visitor(&area);
                        }
                        return;
                    }
                };

                let location = Location::new(lon, lat);
                assembler.add_node(id, location);
                visitor(&RawEntity::Node(RawNode { id, location, tags }));
            })
            .map_err(|e| self.unreadable(e))
    }
}
