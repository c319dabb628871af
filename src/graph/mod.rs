//! OSM multigraph built from raw entities
//!
//! [`OsmGraph`] owns every node and edge of one conversion. Plain nodes and
//! edges form the pedestrian network. Points, lines, zones and polygons are
//! feature nodes that carry a whole feature; they live in their own map keyed
//! by [`FeatureKey`], so a feature never competes with a vertex for its id.
//! All mutation goes through the methods here so the adjacency index stays
//! consistent.

mod geojson;
mod geometry;
mod simplify;

pub use geojson::{geometry_to_json, json_to_geometry, read_feature_collection, write_feature_collection};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use geo::{Geometry, LineString};
use log::debug;

use crate::core::{Error, Result};
use crate::normalize::{FeatureKind, Properties};
use crate::osm::{Location, NodeId, Tags};

/// Kind of a graph node, fixed when the node is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Network vertex referenced by edges
    Plain,
    Point,
    Line,
    Zone,
    Polygon,
}

impl NodeKind {
    /// Normalizer kind applied to nodes of this kind
    pub fn feature_kind(self) -> FeatureKind {
        match self {
            NodeKind::Plain => FeatureKind::Node,
            NodeKind::Point => FeatureKind::Point,
            NodeKind::Line => FeatureKind::Line,
            NodeKind::Zone => FeatureKind::Zone,
            NodeKind::Polygon => FeatureKind::Polygon,
        }
    }

    pub fn is_attribute(self) -> bool {
        matches!(self, NodeKind::Line | NodeKind::Zone | NodeKind::Polygon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    kind: NodeKind,
    location: Option<Location>,
    ndref: Option<Vec<NodeId>>,
    outers: Vec<Vec<NodeId>>,
    indref: Vec<Vec<NodeId>>,
    tags: Tags,
    geometry: Option<Geometry<f64>>,
    normalized: Option<Properties>,
}

impl GraphNode {
    fn new(kind: NodeKind, location: Option<Location>, tags: Tags) -> Self {
        Self {
            kind,
            location,
            ndref: None,
            outers: Vec::new(),
            indref: Vec::new(),
            tags,
            geometry: None,
            normalized: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn lon(&self) -> Option<f64> {
        self.location.map(|l| l.lon)
    }

    pub fn lat(&self) -> Option<f64> {
        self.location.map(|l| l.lat)
    }

    /// Ordered member node ids of a line, or the outer ring of a zone or polygon
    pub fn ndref(&self) -> Option<&[NodeId]> {
        self.ndref.as_deref()
    }

    /// Further outer rings of a multipolygon, after the one in `ndref`
    pub fn extra_outers(&self) -> &[Vec<NodeId>] {
        &self.outers
    }

    /// Inner rings of a zone or polygon
    pub fn indref(&self) -> &[Vec<NodeId>] {
        &self.indref
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn geometry(&self) -> Option<&Geometry<f64>> {
        self.geometry.as_ref()
    }

    pub fn normalized(&self) -> Option<&Properties> {
        self.normalized.as_ref()
    }
}

/// Identity of a feature node: its kind and the id of the OSM entity it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey {
    pub kind: NodeKind,
    pub id: i64,
}

/// Identity of an edge: its endpoints and a sequence number among parallel edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub u: NodeId,
    pub v: NodeId,
    pub key: u32,
}

impl EdgeKey {
    pub fn is_loop(&self) -> bool {
        self.u == self.v
    }
}

/// One original way segment inside a (possibly merged) edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPart {
    pub segment: usize,
    /// Traversed against the direction of the source way
    pub reversed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    osm_id: Option<i64>,
    parts: Vec<SegmentPart>,
    ndref: Vec<NodeId>,
    tags: Tags,
    geometry: Option<LineString<f64>>,
    normalized: Option<Properties>,
}

impl GraphEdge {
    /// Segment `segment` of way `osm_id`, spanning `ndref`
    pub fn new(osm_id: i64, segment: usize, ndref: Vec<NodeId>, tags: Tags) -> Self {
        Self {
            osm_id: Some(osm_id),
            parts: vec![SegmentPart {
                segment,
                reversed: false,
            }],
            ndref,
            tags,
            geometry: None,
            normalized: None,
        }
    }

    pub fn osm_id(&self) -> Option<i64> {
        self.osm_id
    }

    /// Position of the first constituent segment within the source way
    pub fn segment(&self) -> usize {
        self.parts.first().map(|p| p.segment).unwrap_or(0)
    }

    /// Constituent segments in traversal order
    pub fn parts(&self) -> &[SegmentPart] {
        &self.parts
    }

    pub fn ndref(&self) -> &[NodeId] {
        &self.ndref
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn geometry(&self) -> Option<&LineString<f64>> {
        self.geometry.as_ref()
    }

    pub fn normalized(&self) -> Option<&Properties> {
        self.normalized.as_ref()
    }

    /// Same edge walked from its other end
    fn reversed(mut self) -> Self {
        self.ndref.reverse();
        self.parts.reverse();
        for part in &mut self.parts {
            part.reversed = !part.reversed;
        }
        if let Some(geometry) = &mut self.geometry {
            geometry.0.reverse();
        }
        self
    }
}

/// Directed (or undirected) multigraph of one conversion
#[derive(Debug, Clone, Default)]
pub struct OsmGraph {
    nodes: BTreeMap<NodeId, GraphNode>,
    features: BTreeMap<FeatureKey, GraphNode>,
    edges: BTreeMap<EdgeKey, GraphEdge>,
    incident: HashMap<NodeId, BTreeSet<EdgeKey>>,
    /// Coordinates of vertices that are not (or no longer) graph nodes
    locations: HashMap<NodeId, Location>,
    undirected: bool,
}

impl OsmGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_directed(&self) -> bool {
        !self.undirected
    }

    pub fn is_multigraph(&self) -> bool {
        true
    }

    /// Number of network vertices
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of point, line, zone and polygon nodes
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.features.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn feature(&self, kind: NodeKind, id: i64) -> Option<&GraphNode> {
        self.features.get(&FeatureKey { kind, id })
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&GraphEdge> {
        self.edges.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn features(&self) -> impl Iterator<Item = (&FeatureKey, &GraphNode)> {
        self.features.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &GraphEdge)> {
        self.edges.iter()
    }

    /// Number of edge ends at `id`; a self-loop counts twice
    pub fn degree(&self, id: NodeId) -> usize {
        self.incident
            .get(&id)
            .map(|keys| keys.len() + keys.iter().filter(|k| k.is_loop()).count())
            .unwrap_or(0)
    }

    /// Coordinates of `id`, from its vertex or from the location index
    pub fn resolve_location(&self, id: NodeId) -> Option<Location> {
        self.nodes
            .get(&id)
            .and_then(|node| node.location)
            .or_else(|| self.locations.get(&id).copied())
    }

    /// Adds a network vertex, or fills in the location of an existing one
    pub fn add_vertex(&mut self, id: NodeId, location: Option<Location>) {
        let node = self
            .nodes
            .entry(id)
            .or_insert_with(|| GraphNode::new(NodeKind::Plain, None, Tags::new()));
        if node.location.is_none() {
            node.location = location;
        }
    }

    /// Adds a point feature, also when `id` is a network vertex.
    ///
    /// Returns false when a point with that id already exists.
    pub fn add_point(&mut self, id: NodeId, location: Location, tags: Tags) -> bool {
        self.insert_feature(id, GraphNode::new(NodeKind::Point, Some(location), tags))
    }

    /// Adds a line, zone or polygon node. Returns false when one of that kind has `id`.
    pub fn add_attribute_node(
        &mut self,
        id: i64,
        kind: NodeKind,
        ndref: Vec<NodeId>,
        indref: Vec<Vec<NodeId>>,
        tags: Tags,
    ) -> bool {
        self.add_area_node(id, kind, vec![ndref], indref, tags)
    }

    /// Adds a zone or polygon node with one or more outer rings.
    ///
    /// The first outer ring becomes `ndref`. Returns false when `outer` is
    /// empty or a node of that kind already has `id`.
    pub fn add_area_node(
        &mut self,
        id: i64,
        kind: NodeKind,
        outer: Vec<Vec<NodeId>>,
        indref: Vec<Vec<NodeId>>,
        tags: Tags,
    ) -> bool {
        debug_assert!(kind.is_attribute(), "{kind:?} is not an attribute node kind");
        let mut rings = outer.into_iter();
        let Some(ndref) = rings.next() else {
            return false;
        };
        let mut node = GraphNode::new(kind, None, tags);
        node.ndref = Some(ndref);
        node.outers = rings.collect();
        node.indref = indref;
        self.insert_feature(id, node)
    }

    fn insert_feature(&mut self, id: i64, node: GraphNode) -> bool {
        let key = FeatureKey { kind: node.kind, id };
        if self.features.contains_key(&key) {
            return false;
        }
        self.features.insert(key, node);
        true
    }

    /// Merges `tags` into an existing network vertex. Returns false when there is none.
    pub fn merge_node_tags(&mut self, id: NodeId, tags: &Tags) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.tags.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
                true
            }
            None => false,
        }
    }

    /// Remembers the coordinates of a vertex used only by attribute nodes
    pub fn record_location(&mut self, id: NodeId, location: Location) {
        self.locations.insert(id, location);
    }

    /// Adds an edge `u -> v`, creating missing endpoints as vertices without coordinates
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, edge: GraphEdge) -> EdgeKey {
        self.add_vertex(u, None);
        self.add_vertex(v, None);

        let (u, v, edge) = if self.undirected && u > v {
            (v, u, edge.reversed())
        } else {
            (u, v, edge)
        };

        let key = (0..)
            .map(|key| EdgeKey { u, v, key })
            .find(|key| !self.edges.contains_key(key))
            .unwrap_or(EdgeKey { u, v, key: u32::MAX });
        self.insert_edge(key, edge);
        key
    }

    fn insert_edge(&mut self, key: EdgeKey, edge: GraphEdge) {
        self.edges.insert(key, edge);
        self.incident.entry(key.u).or_default().insert(key);
        self.incident.entry(key.v).or_default().insert(key);
    }

    fn remove_edge(&mut self, key: &EdgeKey) -> Option<GraphEdge> {
        let edge = self.edges.remove(key)?;
        for end in [key.u, key.v] {
            if let Some(keys) = self.incident.get_mut(&end) {
                keys.remove(key);
                if keys.is_empty() {
                    self.incident.remove(&end);
                }
            }
        }
        Some(edge)
    }

    /// Removes a vertex without edges, keeping its coordinates for geometry
    fn retire_node(&mut self, id: NodeId) {
        debug_assert_eq!(self.degree(id), 0);
        if let Some(node) = self.nodes.remove(&id) {
            if let Some(location) = node.location {
                self.locations.insert(id, location);
            }
        }
    }

    /// Copy of the graph keeping every node but only the edges accepted by `predicate`
    pub fn filter_edges<F>(&self, predicate: F) -> OsmGraph
    where
        F: Fn(NodeId, NodeId, &GraphEdge) -> bool,
    {
        let mut graph = OsmGraph {
            nodes: self.nodes.clone(),
            features: self.features.clone(),
            locations: self.locations.clone(),
            undirected: self.undirected,
            ..Default::default()
        };
        for (key, edge) in &self.edges {
            if predicate(key.u, key.v, edge) {
                graph.insert_edge(*key, edge.clone());
            }
        }
        graph
    }

    /// Undirected copy: edges are stored from their smaller endpoint, walked accordingly
    pub fn to_undirected(&self) -> OsmGraph {
        let mut graph = OsmGraph {
            nodes: self.nodes.clone(),
            features: self.features.clone(),
            locations: self.locations.clone(),
            undirected: true,
            ..Default::default()
        };
        for (key, edge) in &self.edges {
            graph.add_edge(key.u, key.v, edge.clone());
        }
        graph
    }

    /// Derives normalized tags for every element that has none yet
    pub fn normalize_tags(&mut self) -> Result<()> {
        for (id, node) in self.nodes.iter_mut().filter(|(_, n)| n.normalized.is_none()) {
            let normalized = if node.tags.is_empty() {
                Properties::new()
            } else {
                FeatureKind::Node
                    .normalize(&node.tags)
                    .map_err(|e| with_context(e, format_args!("node {id}")))?
            };
            node.normalized = Some(normalized);
        }

        for (key, node) in self.features.iter_mut().filter(|(_, n)| n.normalized.is_none()) {
            let normalized = key
                .kind
                .feature_kind()
                .normalize(&node.tags)
                .map_err(|e| with_context(e, format_args!("{:?} {}", key.kind, key.id)))?;
            node.normalized = Some(normalized);
        }

        for (key, edge) in self.edges.iter_mut().filter(|(_, e)| e.normalized.is_none()) {
            let normalized = FeatureKind::Way
                .normalize(&edge.tags)
                .map_err(|e| with_context(e, format_args!("edge {} -> {}", key.u, key.v)))?;
            edge.normalized = Some(normalized);
        }

        debug!(
            "Normalized tags of {} nodes, {} features and {} edges",
            self.nodes.len(),
            self.features.len(),
            self.edges.len()
        );
        Ok(())
    }
}

fn with_context(err: Error, element: std::fmt::Arguments<'_>) -> Error {
    match err {
        Error::SchemaValidation(msg) => Error::SchemaValidation(format!("{element}: {msg}")),
        other => other,
    }
}
