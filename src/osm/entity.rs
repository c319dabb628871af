//! Raw entities delivered by an OSM decoder

use std::collections::BTreeMap;

/// Free-form OSM tags, ordered by key
pub type Tags = BTreeMap<String, String>;

/// Node identifier as used by OSM
pub type NodeId = i64;

/// WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lon: f64,
    pub lat: f64,
}

impl Location {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Reference from a way or ring to a node, with its location when the decoder resolved it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRef {
    pub id: NodeId,
    pub location: Option<Location>,
}

impl NodeRef {
    pub fn new(id: NodeId, location: Option<Location>) -> Self {
        Self { id, location }
    }

    pub fn located(id: NodeId, lon: f64, lat: f64) -> Self {
        Self::new(id, Some(Location::new(lon, lat)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub id: NodeId,
    pub location: Location,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawWay {
    pub id: i64,
    pub refs: Vec<NodeRef>,
    pub tags: Tags,
}

/// Area assembled from a closed way or a multipolygon relation
#[derive(Debug, Clone, PartialEq)]
pub struct RawArea {
    pub id: i64,
    pub outer: Vec<Vec<NodeRef>>,
    pub inner: Vec<Vec<NodeRef>>,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawEntity {
    Node(RawNode),
    Way(RawWay),
    Area(RawArea),
}

/// Raw entity type, used to size progress reporting per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Node,
    Way,
    Area,
}

impl RawEntity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            RawEntity::Node(_) => EntityType::Node,
            RawEntity::Way(_) => EntityType::Way,
            RawEntity::Area(_) => EntityType::Area,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            RawEntity::Node(node) => &node.tags,
            RawEntity::Way(way) => &way.tags,
            RawEntity::Area(area) => &area.tags,
        }
    }
}

/// Builds a tag map from `(key, value)` pairs
pub fn tags_from<'a, I>(pairs: I) -> Tags
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
