//! Geometry synthesis from coordinates and node references

use geo::{Contains, Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use log::{debug, info};

use super::{EdgeKey, FeatureKey, GraphNode, NodeKind, OsmGraph};
use crate::core::{Error, Result};
use crate::osm::NodeId;

impl OsmGraph {
    /// Assigns a geometry to every node, feature and edge.
    ///
    /// Must run after all ingestion passes and after [`OsmGraph::simplify`].
    /// Fails with [`Error::ReferentialIntegrity`] when a referenced node or
    /// its coordinates are missing, and with [`Error::MalformedGeometry`]
    /// when a line or ring has too few coordinates.
    pub fn construct_geometries(&mut self) -> Result<()> {
        let mut node_geometries = Vec::with_capacity(self.nodes.len());
        for (id, node) in &self.nodes {
            let location = node.location.ok_or_else(|| {
                Error::ReferentialIntegrity(format!("node {id} has no coordinates"))
            })?;
            node_geometries.push((*id, Geometry::Point(Point::new(location.lon, location.lat))));
        }

        let mut feature_geometries = Vec::with_capacity(self.features.len());
        for (key, node) in &self.features {
            feature_geometries.push((*key, self.feature_geometry(key, node)?));
        }

        let mut edge_geometries = Vec::with_capacity(self.edges.len());
        for (key, edge) in &self.edges {
            self.require_endpoints(key)?;
            let endpoints = [key.u, key.v];
            let ndref: &[NodeId] = if edge.ndref.is_empty() {
                &endpoints
            } else {
                &edge.ndref
            };
            let coords = self.resolve_coords(ndref, key.u)?;
            edge_geometries.push((*key, LineString::new(coords)));
        }

        for (id, geometry) in node_geometries {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.geometry = Some(geometry);
            }
        }
        for (key, geometry) in feature_geometries {
            if let Some(node) = self.features.get_mut(&key) {
                node.geometry = Some(geometry);
            }
        }
        for (key, geometry) in edge_geometries {
            if let Some(edge) = self.edges.get_mut(&key) {
                edge.geometry = Some(geometry);
            }
        }

        info!(
            "Constructed geometries for {} nodes, {} features and {} edges",
            self.nodes.len(),
            self.features.len(),
            self.edges.len()
        );
        Ok(())
    }

    fn feature_geometry(&self, key: &FeatureKey, node: &GraphNode) -> Result<Geometry<f64>> {
        let owner = key.id;
        let geometry = match (&node.ndref, key.kind) {
            (None, _) => {
                let location = node.location.ok_or_else(|| {
                    Error::ReferentialIntegrity(format!("{:?} {owner} has no coordinates", key.kind))
                })?;
                Geometry::Point(Point::new(location.lon, location.lat))
            }
            (Some(ndref), NodeKind::Line) => {
                let coords = self.resolve_coords(ndref, owner)?;
                if coords.len() < 2 {
                    return Err(Error::MalformedGeometry(format!(
                        "line {owner} has {} coordinates",
                        coords.len()
                    )));
                }
                Geometry::LineString(LineString::new(coords))
            }
            (Some(ndref), _) => {
                let exterior = self.resolve_ring(ndref, owner)?;
                let interiors = node
                    .indref
                    .iter()
                    .map(|ring| self.resolve_ring(ring, owner))
                    .collect::<Result<Vec<_>>>()?;
                if node.outers.is_empty() {
                    Geometry::Polygon(Polygon::new(exterior, interiors))
                } else {
                    let mut exteriors = vec![exterior];
                    for ring in &node.outers {
                        exteriors.push(self.resolve_ring(ring, owner)?);
                    }
                    Geometry::MultiPolygon(assemble_multipolygon(owner, exteriors, interiors))
                }
            }
        };
        Ok(geometry)
    }

    fn require_endpoints(&self, key: &EdgeKey) -> Result<()> {
        for end in [key.u, key.v] {
            let node = self.nodes.get(&end).ok_or_else(|| {
                Error::ReferentialIntegrity(format!("edge {} -> {}: node {end} is not in the graph", key.u, key.v))
            })?;
            if node.location.is_none() {
                return Err(Error::ReferentialIntegrity(format!(
                    "edge {} -> {}: node {end} has no coordinates",
                    key.u, key.v
                )));
            }
        }
        Ok(())
    }

    fn resolve_coords(&self, ndref: &[NodeId], owner: NodeId) -> Result<Vec<Coord<f64>>> {
        ndref
            .iter()
            .map(|id| {
                self.resolve_location(*id)
                    .map(|l| Coord { x: l.lon, y: l.lat })
                    .ok_or_else(|| {
                        Error::ReferentialIntegrity(format!("{owner} references node {id} without coordinates"))
                    })
            })
            .collect()
    }

    fn resolve_ring(&self, ndref: &[NodeId], owner: NodeId) -> Result<LineString<f64>> {
        let coords = self.resolve_coords(ndref, owner)?;
        if coords.len() < 4 || coords.first() != coords.last() {
            return Err(Error::MalformedGeometry(format!(
                "{owner} has a ring of {} coordinates that is not closed",
                coords.len()
            )));
        }
        Ok(LineString::new(coords))
    }
}

/// Builds one polygon per outer ring, each inner ring going to the first outer ring that contains it
fn assemble_multipolygon(
    owner: i64,
    exteriors: Vec<LineString<f64>>,
    interiors: Vec<LineString<f64>>,
) -> MultiPolygon<f64> {
    let shells: Vec<Polygon<f64>> = exteriors
        .iter()
        .map(|ring| Polygon::new(ring.clone(), Vec::new()))
        .collect();
    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); exteriors.len()];

    for ring in interiors {
        let slot = ring
            .0
            .first()
            .and_then(|start| shells.iter().position(|shell| shell.contains(&Point::from(*start))))
            .unwrap_or_else(|| {
                debug!("{owner}: inner ring outside every outer ring, attached to the first");
                0
            });
        holes[slot].push(ring);
    }

    MultiPolygon::new(
        exteriors
            .into_iter()
            .zip(holes)
            .map(|(exterior, interiors)| Polygon::new(exterior, interiors))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphEdge;
    use crate::osm::{tags_from, Location, Tags};

    fn footway() -> Tags {
        tags_from([("highway", "footway")])
    }

    #[test]
    fn test_point_from_coordinates() {
        let mut graph = OsmGraph::new();
        graph.add_vertex(1, Some(Location::new(1.0, 1.0)));
        graph.construct_geometries().unwrap();

        let geometry = graph.node(1).and_then(|n| n.geometry()).unwrap();
        assert_eq!(geometry, &Geometry::Point(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_point_feature() {
        let mut graph = OsmGraph::new();
        graph.add_point(1, Location::new(10.0, 20.0), tags_from([("power", "pole")]));
        graph.construct_geometries().unwrap();
        assert_eq!(
            graph.feature(NodeKind::Point, 1).and_then(|n| n.geometry()),
            Some(&Geometry::Point(Point::new(10.0, 20.0)))
        );
    }

    #[test]
    fn test_line_from_ndref() {
        let mut graph = OsmGraph::new();
        for (id, xy) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
            graph.add_vertex(id, Some(Location::new(xy, xy)));
        }
        graph.add_attribute_node(10, NodeKind::Line, vec![1, 2, 3], Vec::new(), Tags::new());
        graph.construct_geometries().unwrap();

        let Some(Geometry::LineString(line)) = graph.feature(NodeKind::Line, 10).and_then(|n| n.geometry()) else {
            panic!("expected a line string");
        };
        assert_eq!(line.0.len(), 3);
        assert_eq!(line.0[2], Coord { x: 3.0, y: 3.0 });
    }

    #[test]
    fn test_polygon_with_hole_from_location_index() {
        let mut graph = OsmGraph::new();
        let square = [(1, 0.0, 0.0), (2, 4.0, 0.0), (3, 4.0, 4.0), (4, 0.0, 4.0)];
        let hole = [(5, 1.0, 1.0), (6, 2.0, 1.0), (7, 2.0, 2.0)];
        for (id, lon, lat) in square.iter().chain(hole.iter()) {
            graph.record_location(*id, Location::new(*lon, *lat));
        }
        graph.add_attribute_node(20, NodeKind::Polygon, vec![1, 2, 3, 4, 1], vec![vec![5, 6, 7, 5]], Tags::new());
        graph.construct_geometries().unwrap();

        let Some(Geometry::Polygon(polygon)) = graph.feature(NodeKind::Polygon, 20).and_then(|n| n.geometry()) else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_eq!(polygon.interiors().len(), 1);
    }

    #[test]
    fn test_multipolygon_assigns_holes_to_their_outer_ring() {
        let mut graph = OsmGraph::new();
        let vertices = [
            (1, 0.0, 0.0),
            (2, 4.0, 0.0),
            (3, 4.0, 4.0),
            (4, 0.0, 4.0),
            (11, 10.0, 0.0),
            (12, 14.0, 0.0),
            (13, 14.0, 4.0),
            (14, 10.0, 4.0),
            (21, 11.0, 1.0),
            (22, 12.0, 1.0),
            (23, 12.0, 2.0),
        ];
        for (id, lon, lat) in vertices {
            graph.record_location(id, Location::new(lon, lat));
        }
        graph.add_area_node(
            30,
            NodeKind::Polygon,
            vec![vec![1, 2, 3, 4, 1], vec![11, 12, 13, 14, 11]],
            vec![vec![21, 22, 23, 21]],
            tags_from([("building", "yes")]),
        );
        graph.construct_geometries().unwrap();

        let Some(Geometry::MultiPolygon(multi)) = graph.feature(NodeKind::Polygon, 30).and_then(|n| n.geometry())
        else {
            panic!("expected a multipolygon");
        };
        assert_eq!(multi.0.len(), 2);
        assert!(multi.0[0].interiors().is_empty());
        assert_eq!(multi.0[1].interiors().len(), 1);
    }

    #[test]
    fn test_edge_geometry_follows_ndref() {
        let mut graph = OsmGraph::new();
        graph.add_vertex(1, Some(Location::new(0.0, 0.0)));
        graph.add_vertex(3, Some(Location::new(2.0, 0.0)));
        graph.record_location(2, Location::new(1.0, 1.0));
        graph.add_edge(1, 3, GraphEdge::new(7, 0, vec![1, 2, 3], footway()));
        graph.construct_geometries().unwrap();

        let (_, edge) = graph.edges().next().unwrap();
        let line = edge.geometry().unwrap();
        assert_eq!(line.0.len(), 3);
        assert_eq!(line.0[1], Coord { x: 1.0, y: 1.0 });
    }

    #[test]
    fn test_edge_without_ndref_is_straight() {
        let mut graph = OsmGraph::new();
        graph.add_vertex(1, Some(Location::new(0.0, 0.0)));
        graph.add_vertex(2, Some(Location::new(1.0, 0.0)));
        graph.add_edge(1, 2, GraphEdge::new(7, 0, Vec::new(), footway()));
        graph.construct_geometries().unwrap();

        let (_, edge) = graph.edges().next().unwrap();
        assert_eq!(edge.geometry().unwrap().0.len(), 2);
    }

    #[test]
    fn test_missing_endpoint_coordinates_fail() {
        let mut graph = OsmGraph::new();
        graph.add_vertex(1, Some(Location::new(0.0, 0.0)));
        graph.add_edge(1, 2, GraphEdge::new(7, 0, vec![1, 2], footway()));

        let err = graph.construct_geometries().unwrap_err();
        assert!(matches!(err, Error::ReferentialIntegrity(_)));
        assert!(graph.edges().all(|(_, e)| e.geometry().is_none()));
    }

    #[test]
    fn test_unresolvable_ndref_fails() {
        let mut graph = OsmGraph::new();
        graph.add_vertex(1, Some(Location::new(0.0, 0.0)));
        graph.add_attribute_node(10, NodeKind::Line, vec![1, 99], Vec::new(), Tags::new());
        assert!(matches!(graph.construct_geometries(), Err(Error::ReferentialIntegrity(_))));
    }

    #[test]
    fn test_open_ring_is_malformed() {
        let mut graph = OsmGraph::new();
        for id in 1..=3 {
            graph.record_location(id, Location::new(id as f64, 0.0));
        }
        graph.add_attribute_node(20, NodeKind::Zone, vec![1, 2, 3], Vec::new(), Tags::new());
        let err = graph.construct_geometries().unwrap_err();
        assert!(err.is_internal());
    }
}
