//! Entity counting pass, sizing progress reporting before the parse pass

use log::info;

use crate::core::Result;
use crate::normalize::FeatureKind;

use super::entity::EntityType;
use super::source::EntitySource;

/// Per-type totals from one full pass over a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub nodes: u64,
    pub ways: u64,
    pub areas: u64,
}

impl EntityCounts {
    pub fn for_type(&self, entity_type: EntityType) -> u64 {
        match entity_type {
            EntityType::Node => self.nodes,
            EntityType::Way => self.ways,
            EntityType::Area => self.areas,
        }
    }

    /// Number of raw entities the parser of `kind` will visit
    pub fn for_kind(&self, kind: FeatureKind) -> u64 {
        self.for_type(kind.entity_type())
    }
}

/// Counts nodes, ways and areas in a single pass
pub fn count_all(source: &dyn EntitySource) -> Result<EntityCounts> {
    let mut counts = EntityCounts::default();
    source.for_each_entity(&mut |entity| match entity.entity_type() {
        EntityType::Node => counts.nodes += 1,
        EntityType::Way => counts.ways += 1,
        EntityType::Area => counts.areas += 1,
    })?;

    info!(
        "Counted {} nodes, {} ways, {} areas",
        counts.nodes, counts.ways, counts.areas
    );
    Ok(counts)
}

/// Counts the raw entities visited by the parser of `kind`
pub fn count_entities(source: &dyn EntitySource, kind: FeatureKind) -> Result<u64> {
    let wanted = kind.entity_type();
    let mut count = 0;
    source.for_each_entity(&mut |entity| {
        if entity.entity_type() == wanted {
            count += 1;
        }
    })?;
    Ok(count)
}
