//! Ingestion visitors turning raw entities into graph elements
//!
//! There is one [`OsmParser`] per feature kind. Ways become edges. Points,
//! lines, zones and polygons become feature nodes, and the node parser
//! attaches tags to vertices the way parsers created. [`parse_graph`] runs them in two
//! passes so that node tags always find their vertices.

use log::{debug, info, warn};

use crate::core::{ProgressCallback, Result};
use crate::graph::{GraphEdge, NodeKind, OsmGraph};
use crate::normalize::FeatureKind;

use super::counter::EntityCounts;
use super::entity::{EntityType, NodeId, NodeRef, RawArea, RawEntity, RawNode, RawWay, Tags};
use super::source::EntitySource;

/// Inclusion predicate over raw tags
pub type TagFilter = Box<dyn Fn(&Tags) -> bool + Send + Sync>;

/// Visitor for the raw entities of one feature kind
pub struct OsmParser {
    kind: FeatureKind,
    filter: Option<TagFilter>,
    progress: Option<ProgressCallback>,
    total: u64,
    visited: u64,
}

impl OsmParser {
    /// Parser accepting every entity of the kind's raw type
    pub fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            filter: None,
            progress: None,
            total: 0,
            visited: 0,
        }
    }

    /// Parser accepting only entities the kind's normalizer recognizes
    pub fn osw(kind: FeatureKind) -> Self {
        Self::new(kind).with_filter(move |tags| kind.classify(tags))
    }

    pub fn with_filter(mut self, filter: impl Fn(&Tags) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Reports `(kind, visited, total)` after every visited entity
    pub fn with_progress(mut self, callback: ProgressCallback, total: u64) -> Self {
        self.progress = Some(callback);
        self.total = total;
        self
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Entities of this parser's raw type seen so far
    pub fn visited(&self) -> u64 {
        self.visited
    }

    fn includes(&self, tags: &Tags) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(tags))
    }

    /// Visits one raw entity, ignoring entities of other raw types
    pub fn visit(&mut self, entity: &RawEntity, graph: &mut OsmGraph) {
        if entity.entity_type() != self.kind.entity_type() {
            return;
        }

        self.visited += 1;
        if let Some(progress) = &self.progress {
            progress(self.kind, self.visited, self.total);
        }

        if !self.includes(entity.tags()) {
            return;
        }

        match (self.kind, entity) {
            (FeatureKind::Way, RawEntity::Way(way)) => add_way(graph, way),
            (FeatureKind::Line, RawEntity::Way(way)) => add_line(graph, way),
            (FeatureKind::Node, RawEntity::Node(node)) => add_node_tags(graph, node),
            (FeatureKind::Point, RawEntity::Node(node)) => add_point(graph, node),
            (FeatureKind::Zone, RawEntity::Area(area)) => add_area(graph, NodeKind::Zone, area),
            (FeatureKind::Polygon, RawEntity::Area(area)) => add_area(graph, NodeKind::Polygon, area),
            _ => {}
        }
    }
}

fn add_way(graph: &mut OsmGraph, way: &RawWay) {
    if way.refs.len() < 2 {
        debug!("Skipping way {} with {} node(s)", way.id, way.refs.len());
        return;
    }

    for node in &way.refs {
        graph.add_vertex(node.id, node.location);
    }
    for (segment, pair) in way.refs.windows(2).enumerate() {
        let (u, v) = (pair[0].id, pair[1].id);
        graph.add_edge(u, v, GraphEdge::new(way.id, segment, vec![u, v], way.tags.clone()));
    }
}

fn record_locations(graph: &mut OsmGraph, refs: &[NodeRef]) -> Vec<NodeId> {
    refs.iter()
        .map(|node| {
            if let Some(location) = node.location {
                graph.record_location(node.id, location);
            }
            node.id
        })
        .collect()
}

fn add_line(graph: &mut OsmGraph, way: &RawWay) {
    let ndref = record_locations(graph, &way.refs);
    if !graph.add_attribute_node(way.id, NodeKind::Line, ndref, Vec::new(), way.tags.clone()) {
        warn!("Skipping line {}: a line with this id is already in the graph", way.id);
    }
}

fn add_node_tags(graph: &mut OsmGraph, node: &RawNode) {
    if graph.merge_node_tags(node.id, &node.tags) {
        graph.add_vertex(node.id, Some(node.location));
    }
}

fn add_point(graph: &mut OsmGraph, node: &RawNode) {
    if graph.contains_node(node.id) {
        debug!("Point {} is also a network vertex", node.id);
    }
    if !graph.add_point(node.id, node.location, node.tags.clone()) {
        warn!("Skipping point {}: a point with this id is already in the graph", node.id);
    }
}

fn add_area(graph: &mut OsmGraph, kind: NodeKind, area: &RawArea) {
    if area.outer.is_empty() {
        debug!("Skipping area {} without an outer ring", area.id);
        return;
    }

    let outer = area
        .outer
        .iter()
        .map(|ring| record_locations(graph, ring))
        .collect();
    let indref = area
        .inner
        .iter()
        .map(|ring| record_locations(graph, ring))
        .collect();
    if !graph.add_area_node(area.id, kind, outer, indref, area.tags.clone()) {
        warn!("Skipping {kind:?} area {}: one with this id is already in the graph", area.id);
    }
}

/// The six OSW parsers, reporting progress against `counts` when a callback is given
pub fn default_parsers(counts: &EntityCounts, progress: Option<ProgressCallback>) -> Vec<OsmParser> {
    FeatureKind::ALL
        .iter()
        .map(|&kind| {
            let parser = OsmParser::osw(kind);
            match &progress {
                Some(callback) => parser.with_progress(callback.clone(), counts.for_kind(kind)),
                None => parser,
            }
        })
        .collect()
}

/// Builds a graph from `source` with the given parsers.
///
/// Way and area parsers run in a first pass, node parsers in a second one,
/// so that node tags attach to vertices created by ways.
pub fn parse_graph(source: &dyn EntitySource, parsers: &mut [OsmParser]) -> Result<OsmGraph> {
    let mut graph = OsmGraph::new();
    let (node_parsers, shape_parsers): (Vec<&mut OsmParser>, Vec<&mut OsmParser>) = parsers
        .iter_mut()
        .partition(|parser| parser.kind.entity_type() == EntityType::Node);

    for mut group in [shape_parsers, node_parsers] {
        if group.is_empty() {
            continue;
        }
        source.for_each_entity(&mut |entity| {
            for parser in group.iter_mut() {
                parser.visit(entity, &mut graph);
            }
        })?;
    }

    info!(
        "Parsed graph with {} nodes, {} features and {} edges",
        graph.node_count(),
        graph.feature_count(),
        graph.edge_count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::{tags_from, Location};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn node(id: NodeId, tags: Tags) -> RawEntity {
        RawEntity::Node(RawNode {
            id,
            location: Location::new(id as f64, 0.0),
            tags,
        })
    }

    fn way(id: i64, refs: &[NodeId], tags: Tags) -> RawEntity {
        RawEntity::Way(RawWay {
            id,
            refs: refs.iter().map(|&r| NodeRef::located(r, r as f64, 0.0)).collect(),
            tags,
        })
    }

    fn sidewalk() -> Tags {
        tags_from([("highway", "footway"), ("footway", "sidewalk")])
    }

    #[test]
    fn test_progress_is_reported_for_every_visited_entity() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let callback: ProgressCallback = Arc::new(move |kind, visited, total| {
            assert_eq!(kind, FeatureKind::Way);
            assert_eq!(total, 2);
            counter.store(visited, Ordering::SeqCst);
        });

        let mut parser = OsmParser::osw(FeatureKind::Way).with_progress(callback, 2);
        let mut graph = OsmGraph::new();
        parser.visit(&way(1, &[1, 2], sidewalk()), &mut graph);
        parser.visit(&way(2, &[2, 3], tags_from([("building", "yes")])), &mut graph);
        parser.visit(&node(9, Tags::new()), &mut graph);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(parser.visited(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_way_adds_one_edge_per_segment() {
        let mut graph = OsmGraph::new();
        OsmParser::new(FeatureKind::Way).visit(&way(7, &[1, 2, 3, 4], sidewalk()), &mut graph);

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.node_count(), 4);
        let segments: Vec<usize> = graph.edges().map(|(_, e)| e.segment()).collect();
        assert_eq!(segments, vec![0, 1, 2]);
        assert_eq!(graph.node(3).and_then(|n| n.lon()), Some(3.0));
    }

    #[test]
    fn test_filtered_way_adds_nothing() {
        let mut graph = OsmGraph::new();
        let mut parser = OsmParser::new(FeatureKind::Way).with_filter(|_| false);
        parser.visit(&way(7, &[1, 2], sidewalk()), &mut graph);
        assert!(graph.is_empty());
        assert_eq!(parser.visited(), 1);
    }

    #[test]
    fn test_node_parser_only_tags_existing_vertices() {
        let mut graph = OsmGraph::new();
        OsmParser::new(FeatureKind::Way).visit(&way(7, &[1, 2], sidewalk()), &mut graph);

        let mut nodes = OsmParser::osw(FeatureKind::Node);
        nodes.visit(&node(1, tags_from([("kerb", "lowered")])), &mut graph);
        nodes.visit(&node(5, tags_from([("kerb", "raised")])), &mut graph);

        assert_eq!(graph.node_count(), 2);
        assert!(!graph.contains_node(5));
        assert_eq!(graph.node(1).unwrap().tags().get("kerb").map(String::as_str), Some("lowered"));
    }

    #[test]
    fn test_point_parser_adds_point_node() {
        let mut graph = OsmGraph::new();
        OsmParser::osw(FeatureKind::Point).visit(&node(3, tags_from([("power", "pole")])), &mut graph);
        assert_eq!(graph.feature(NodeKind::Point, 3).map(|n| n.kind()), Some(NodeKind::Point));
        assert!(!graph.contains_node(3));
    }

    #[test]
    fn test_point_on_way_vertex_is_kept() {
        let source = vec![
            node(1, Tags::new()),
            node(2, tags_from([("barrier", "bollard")])),
            node(3, Tags::new()),
            way(7, &[1, 2, 3], sidewalk()),
        ];
        let counts = EntityCounts { nodes: 3, ways: 1, areas: 0 };
        let graph = parse_graph(&source, &mut default_parsers(&counts, None)).unwrap();

        let bollard = graph.feature(NodeKind::Point, 2).unwrap();
        assert_eq!(bollard.tags().get("barrier").map(String::as_str), Some("bollard"));
        assert_eq!(bollard.location(), Some(Location::new(2.0, 0.0)));
        assert_eq!(graph.node(2).map(|n| n.kind()), Some(NodeKind::Plain));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_line_without_nodes_adds_attribute_node() {
        let mut graph = OsmGraph::new();
        OsmParser::new(FeatureKind::Line).visit(&way(11, &[], tags_from([("barrier", "fence")])), &mut graph);

        assert_eq!(graph.feature_count(), 1);
        assert_eq!(graph.feature(NodeKind::Line, 11).and_then(|n| n.ndref()), Some(&[][..]));
    }

    #[test]
    fn test_zone_adds_attribute_node_and_ring_locations() {
        let ring: Vec<NodeRef> = [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0), (1, 0.0, 0.0)]
            .iter()
            .map(|&(id, lon, lat)| NodeRef::located(id, lon, lat))
            .collect();
        let area = RawEntity::Area(RawArea {
            id: 40,
            outer: vec![ring],
            inner: Vec::new(),
            tags: tags_from([("highway", "pedestrian"), ("area", "yes")]),
        });

        let mut graph = OsmGraph::new();
        OsmParser::osw(FeatureKind::Zone).visit(&area, &mut graph);

        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.feature_count(), 1);
        let zone = graph.feature(NodeKind::Zone, 40).unwrap();
        assert_eq!(zone.kind(), NodeKind::Zone);
        assert_eq!(zone.ndref(), Some(&[1, 2, 3, 1][..]));
        assert_eq!(graph.resolve_location(3), Some(Location::new(1.0, 1.0)));
    }

    #[test]
    fn test_area_without_outer_ring_is_skipped() {
        let area = RawEntity::Area(RawArea {
            id: 41,
            outer: Vec::new(),
            inner: Vec::new(),
            tags: tags_from([("building", "yes")]),
        });
        let mut graph = OsmGraph::new();
        OsmParser::osw(FeatureKind::Polygon).visit(&area, &mut graph);
        assert!(graph.is_empty());
    }

    fn building(id: i64, refs: &[NodeId]) -> RawEntity {
        let ring = refs.iter().map(|&r| NodeRef::located(r, r as f64, 1.0)).collect();
        RawEntity::Area(RawArea {
            id,
            outer: vec![ring],
            inner: Vec::new(),
            tags: tags_from([("building", "yes")]),
        })
    }

    #[test]
    fn test_area_id_equal_to_vertex_id_keeps_both() {
        // Area 10 comes from building way 5 and shares its id with a sidewalk vertex
        for building_first in [true, false] {
            let mut entities = vec![building(10, &[20, 21, 22, 20]), way(7, &[10, 11], sidewalk())];
            if !building_first {
                entities.reverse();
            }
            let counts = EntityCounts { nodes: 0, ways: 1, areas: 1 };
            let graph = parse_graph(&entities, &mut default_parsers(&counts, None)).unwrap();

            assert_eq!(graph.edge_count(), 1);
            assert_eq!(graph.node(10).map(|n| n.kind()), Some(NodeKind::Plain));
            assert_eq!(graph.feature(NodeKind::Polygon, 10).map(|n| n.kind()), Some(NodeKind::Polygon));
        }
    }

    #[test]
    fn test_line_id_equal_to_vertex_id_keeps_both() {
        let mut graph = OsmGraph::new();
        OsmParser::new(FeatureKind::Line).visit(&way(2, &[5, 6], tags_from([("barrier", "fence")])), &mut graph);
        OsmParser::new(FeatureKind::Way).visit(&way(9, &[1, 2], sidewalk()), &mut graph);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node(2).map(|n| n.kind()), Some(NodeKind::Plain));
        assert_eq!(graph.feature(NodeKind::Line, 2).map(|n| n.kind()), Some(NodeKind::Line));
    }

    #[test]
    fn test_multipolygon_keeps_every_outer_ring() {
        let ring = |ids: &[NodeId]| ids.iter().map(|&r| NodeRef::located(r, r as f64, 0.0)).collect::<Vec<_>>();
        let area = RawEntity::Area(RawArea {
            id: 81,
            outer: vec![ring(&[1, 2, 3, 1]), ring(&[4, 5, 6, 4])],
            inner: Vec::new(),
            tags: tags_from([("building", "yes")]),
        });
        let mut graph = OsmGraph::new();
        OsmParser::osw(FeatureKind::Polygon).visit(&area, &mut graph);

        let polygon = graph.feature(NodeKind::Polygon, 81).unwrap();
        assert_eq!(polygon.ndref(), Some(&[1, 2, 3, 1][..]));
        assert_eq!(polygon.extra_outers(), &[vec![4, 5, 6, 4]]);
        assert_eq!(graph.resolve_location(5), Some(Location::new(5.0, 0.0)));
    }

    #[test]
    fn test_parse_graph_runs_node_parsers_after_ways() {
        // Nodes come first in the stream, before the way that references them
        let source = vec![
            node(1, tags_from([("kerb", "flush")])),
            node(2, Tags::new()),
            way(7, &[1, 2], sidewalk()),
        ];
        let counts = EntityCounts { nodes: 2, ways: 1, areas: 0 };
        let mut parsers = default_parsers(&counts, None);
        let graph = parse_graph(&source, &mut parsers).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node(1).unwrap().tags().get("kerb").map(String::as_str), Some("flush"));
        assert!(parsers.iter().all(|p| p.visited() == counts.for_kind(p.kind())));
    }
}
