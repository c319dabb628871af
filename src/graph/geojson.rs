//! Graph to GeoJSON codec
//!
//! The forward direction writes one FeatureCollection per kind that has at
//! least one element. The inverse rebuilds a graph from a nodes and an edges
//! collection, keeping geometry and properties as they are.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use log::{debug, info};
use serde_json::{json, Value};

use super::{EdgeKey, GraphEdge, GraphNode, NodeKind, OsmGraph};
use crate::core::{Error, OutputPaths, Result};
use crate::normalize::Properties;
use crate::osm::{Location, NodeId, Tags};

const ID: &str = "_id";
const U_ID: &str = "_u_id";
const V_ID: &str = "_v_id";

impl OsmGraph {
    /// Writes the graph as up to six FeatureCollections.
    ///
    /// Returns the paths that were written, in nodes, edges, points, lines,
    /// zones, polygons order. Kinds without elements produce no file.
    pub fn to_geojson(&self, paths: &OutputPaths) -> Result<Vec<PathBuf>> {
        let mut collections: [(&Path, Vec<Value>); 6] = [
            (&paths.nodes, Vec::new()),
            (&paths.edges, Vec::new()),
            (&paths.points, Vec::new()),
            (&paths.lines, Vec::new()),
            (&paths.zones, Vec::new()),
            (&paths.polygons, Vec::new()),
        ];

        for (id, node) in &self.nodes {
            collections[0].1.push(node_feature(*id, node)?);
        }
        for (key, node) in &self.features {
            let slot = match key.kind {
                NodeKind::Plain => 0,
                NodeKind::Point => 2,
                NodeKind::Line => 3,
                NodeKind::Zone => 4,
                NodeKind::Polygon => 5,
            };
            collections[slot].1.push(node_feature(key.id, node)?);
        }
        for (key, edge) in &self.edges {
            collections[1].1.push(edge_feature(key, edge)?);
        }

        let mut written = Vec::new();
        for (path, features) in collections {
            if features.is_empty() {
                continue;
            }
            debug!("Writing {} features to {}", features.len(), path.display());
            write_feature_collection(path, features)?;
            written.push(path.to_path_buf());
        }

        info!("Wrote {} GeoJSON collections", written.len());
        Ok(written)
    }

    /// Rebuilds a graph from a nodes and an edges FeatureCollection.
    ///
    /// Nodes are keyed by `_id` and edges connect `_u_id` to `_v_id`.
    /// Geometry and the remaining properties are taken over unchanged.
    pub fn from_geojson(nodes_path: &Path, edges_path: &Path) -> Result<OsmGraph> {
        let mut graph = OsmGraph::new();

        for feature in read_feature_collection(nodes_path)? {
            let (mut properties, geometry) = split_feature(feature)?;
            let id = take_id(&mut properties, ID)?;
            let Geometry::Point(point) = geometry else {
                return Err(Error::InvalidGeoJson(format!("node {id} is not a Point")));
            };

            let mut node = GraphNode::new(NodeKind::Plain, Some(Location::new(point.x(), point.y())), Tags::new());
            node.geometry = Some(Geometry::Point(point));
            node.normalized = Some(properties);
            if graph.nodes.insert(id, node).is_some() {
                return Err(Error::InvalidGeoJson(format!("duplicate node {id}")));
            }
        }

        for feature in read_feature_collection(edges_path)? {
            let (mut properties, geometry) = split_feature(feature)?;
            let u = take_id(&mut properties, U_ID)?;
            let v = take_id(&mut properties, V_ID)?;
            let Geometry::LineString(line) = geometry else {
                return Err(Error::InvalidGeoJson(format!("edge {u} -> {v} is not a LineString")));
            };

            let edge = GraphEdge {
                osm_id: None,
                parts: Vec::new(),
                ndref: vec![u, v],
                tags: Tags::new(),
                geometry: Some(line),
                normalized: Some(properties),
            };
            graph.add_edge(u, v, edge);
        }

        info!(
            "Loaded graph with {} nodes and {} edges from GeoJSON",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

fn node_feature(id: NodeId, node: &GraphNode) -> Result<Value> {
    let geometry = node
        .geometry
        .as_ref()
        .ok_or_else(|| Error::MissingGeometry(format!("node {id}")))?;

    let mut properties = node.normalized.clone().unwrap_or_default();
    properties.insert(ID.to_string(), json!(id));
    Ok(feature(geometry_to_json(geometry)?, properties))
}

fn edge_feature(key: &EdgeKey, edge: &GraphEdge) -> Result<Value> {
    let line = edge
        .geometry
        .as_ref()
        .ok_or_else(|| Error::MissingGeometry(format!("edge {} -> {}", key.u, key.v)))?;

    let mut properties = edge.normalized.clone().unwrap_or_default();
    if !properties.contains_key(ID) {
        let id = match edge.osm_id {
            Some(osm_id) => format!("{osm_id}.{}", edge.segment()),
            None => format!("{}-{}-{}", key.u, key.v, key.key),
        };
        properties.insert(ID.to_string(), json!(id));
    }
    properties.insert(U_ID.to_string(), json!(key.u));
    properties.insert(V_ID.to_string(), json!(key.v));

    let geometry = geometry_to_json(&Geometry::LineString(line.clone()))?;
    Ok(feature(geometry, properties))
}

fn feature(geometry: Value, properties: Properties) -> Value {
    json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": properties,
    })
}

/// Splits a Feature into its properties and decoded geometry
fn split_feature(mut feature: Value) -> Result<(Properties, Geometry<f64>)> {
    let geometry = feature
        .get("geometry")
        .ok_or_else(|| Error::InvalidGeoJson("feature without geometry".to_string()))
        .and_then(json_to_geometry)?;

    let properties = match feature.get_mut("properties").map(Value::take) {
        Some(Value::Object(properties)) => properties,
        Some(Value::Null) | None => Properties::new(),
        Some(_) => return Err(Error::InvalidGeoJson("properties is not an object".to_string())),
    };
    Ok((properties, geometry))
}

/// Removes an identifier property, accepting numbers and numeric strings
fn take_id(properties: &mut Properties, key: &str) -> Result<NodeId> {
    let value = properties.remove(key);
    value
        .as_ref()
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .ok_or_else(|| Error::InvalidGeoJson(format!("missing or non-numeric {key}: {value:?}")))
}

/// Encodes a geometry as a GeoJSON geometry object
pub fn geometry_to_json(geometry: &Geometry<f64>) -> Result<Value> {
    let value = match geometry {
        Geometry::Point(point) => json!({"type": "Point", "coordinates": [point.x(), point.y()]}),
        Geometry::LineString(line) => json!({"type": "LineString", "coordinates": ring_json(line)}),
        Geometry::Polygon(polygon) => json!({"type": "Polygon", "coordinates": polygon_json(polygon)}),
        Geometry::MultiPolygon(multi) => json!({
            "type": "MultiPolygon",
            "coordinates": multi.iter().map(polygon_json).collect::<Vec<_>>(),
        }),
        _ => {
            return Err(Error::InvalidGeoJson(
                "only Point, LineString, Polygon and MultiPolygon geometries are supported".to_string(),
            ))
        }
    };
    Ok(value)
}

fn ring_json(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

fn polygon_json(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_json)
        .collect()
}

/// Decodes a GeoJSON geometry object
pub fn json_to_geometry(value: &Value) -> Result<Geometry<f64>> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
    let coordinates = value
        .get("coordinates")
        .ok_or_else(|| Error::InvalidGeoJson(format!("{kind} geometry without coordinates")))?;

    match kind {
        "Point" => {
            let coord = position(coordinates)?;
            Ok(Geometry::Point(Point::from(coord)))
        }
        "LineString" => Ok(Geometry::LineString(line_string(coordinates)?)),
        "Polygon" => Ok(Geometry::Polygon(polygon(coordinates)?)),
        "MultiPolygon" => {
            let polygons = array(coordinates)?
                .iter()
                .map(polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(Error::InvalidGeoJson(format!("unsupported geometry type '{other}'"))),
    }
}

fn array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::InvalidGeoJson(format!("expected an array, found {value}")))
}

fn position(value: &Value) -> Result<Coord<f64>> {
    match array(value)?.as_slice() {
        [x, y, ..] => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => Err(Error::InvalidGeoJson(format!("non-numeric position {value}"))),
        },
        _ => Err(Error::InvalidGeoJson(format!("position needs two numbers: {value}"))),
    }
}

fn line_string(value: &Value) -> Result<LineString<f64>> {
    let coords = array(value)?.iter().map(position).collect::<Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = array(value)?.iter().map(line_string);
    let exterior = rings
        .next()
        .ok_or_else(|| Error::InvalidGeoJson("polygon without rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Reads the features of a FeatureCollection file
pub fn read_feature_collection(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path).map_err(|e| Error::InputUnreadable(format!("{}: {e}", path.display())))?;
    let mut document: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::InvalidGeoJson(format!("{}: {e}", path.display())))?;

    if document.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(Error::InvalidGeoJson(format!(
            "{} is not a FeatureCollection",
            path.display()
        )));
    }
    match document.get_mut("features").map(Value::take) {
        Some(Value::Array(features)) => Ok(features),
        _ => Err(Error::InvalidGeoJson(format!("{} has no features array", path.display()))),
    }
}

/// Writes `features` as one FeatureCollection to `path`
pub fn write_feature_collection(path: &Path, features: Vec<Value>) -> Result<()> {
    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    let file = File::create(path).map_err(|e| Error::write(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection).map_err(|e| Error::write(path, e.into()))?;
    writer.flush().map_err(|e| Error::write(path, e))
}
