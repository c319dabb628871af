//! Area assembly for the file-backed entity sources
//!
//! Both decoders stream nodes before ways before relations. The assembler
//! remembers node locations and way references as they go by, so ways can
//! carry resolved locations and areas can be built from closed ways and
//! multipolygon relations.

use std::collections::HashMap;

use log::{debug, warn};

use super::entity::{Location, NodeId, NodeRef, RawArea, RawEntity, RawWay, Tags};

/// Member of a relation, restricted to what area assembly needs
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WayMember {
    pub way_id: i64,
    pub role: String,
}

#[derive(Default)]
pub(crate) struct AreaAssembler {
    locations: HashMap<NodeId, Location>,
    way_refs: HashMap<i64, Vec<NodeId>>,
}

impl AreaAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId, location: Location) {
        self.locations.insert(id, location);
    }

    fn resolve(&self, refs: &[NodeId]) -> Vec<NodeRef> {
        refs.iter()
            .map(|id| NodeRef::new(*id, self.locations.get(id).copied()))
            .collect()
    }

    /// Resolves a way and, when it is closed, the area built from it
    pub fn way(&mut self, id: i64, refs: Vec<NodeId>, tags: Tags) -> (RawEntity, Option<RawEntity>) {
        let resolved = self.resolve(&refs);

        let area = if is_closed(&refs) && tags.get("area").map(String::as_str) != Some("no") {
            Some(RawEntity::Area(RawArea {
                id: 2 * id,
                outer: vec![resolved.clone()],
                inner: Vec::new(),
                tags: tags.clone(),
            }))
        } else {
            None
        };

        self.way_refs.insert(id, refs);
        (
            RawEntity::Way(RawWay {
                id,
                refs: resolved,
                tags,
            }),
            area,
        )
    }

    /// Builds the area of a multipolygon relation, if its rings close
    pub fn relation(&self, id: i64, members: &[WayMember], mut tags: Tags) -> Option<RawEntity> {
        if tags.get("type").map(String::as_str) != Some("multipolygon") {
            return None;
        }

        let mut outer_parts = Vec::new();
        let mut inner_parts = Vec::new();
        for member in members {
            let Some(refs) = self.way_refs.get(&member.way_id) else {
                debug!("Relation {id}: member way {} not in extract", member.way_id);
                return None;
            };
            match member.role.as_str() {
                "inner" => inner_parts.push(refs.clone()),
                _ => outer_parts.push(refs.clone()),
            }
        }

        let (Some(outer), Some(inner)) = (assemble_rings(outer_parts), assemble_rings(inner_parts)) else {
            warn!("Relation {id}: multipolygon rings do not close, area skipped");
            return None;
        };
        if outer.is_empty() {
            return None;
        }

        tags.remove("type");
        Some(RawEntity::Area(RawArea {
            id: 2 * id + 1,
            outer: outer.iter().map(|ring| self.resolve(ring)).collect(),
            inner: inner.iter().map(|ring| self.resolve(ring)).collect(),
            tags,
        }))
    }
}

fn is_closed(refs: &[NodeId]) -> bool {
    refs.len() >= 4 && refs.first() == refs.last()
}

/// Joins way parts end to end into closed rings. Returns `None` when a ring cannot be closed.
fn assemble_rings(mut parts: Vec<Vec<NodeId>>) -> Option<Vec<Vec<NodeId>>> {
    let mut rings = Vec::new();
    parts.retain(|part| part.len() >= 2);

    while let Some(mut ring) = parts.pop() {
        while !is_closed(&ring) {
            let tail = *ring.last()?;
            let position = parts
                .iter()
                .position(|part| part.first() == Some(&tail) || part.last() == Some(&tail))?;
            let mut next = parts.swap_remove(position);
            if next.first() != Some(&tail) {
                next.reverse();
            }
            ring.extend(next.into_iter().skip(1));
        }
        rings.push(ring);
    }

    Some(rings)
}
