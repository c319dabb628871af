//! OSM XML encoding of a merged OSW collection

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use geo::{Coord, Geometry, LineString, Point, Polygon};
use log::{info, warn};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde_json::Value;

use crate::core::{Error, Result};
use crate::graph::{json_to_geometry, read_feature_collection};
use crate::normalize::Properties;
use crate::osm::Location;

const GENERATOR: &str = "osm-osw-reformatter";

/// Internal identifier properties, never written as tags
const RESERVED: &[&str] = &["_id", "_u_id", "_v_id"];

/// Fixed-point scale of OSM coordinates
const COORD_SCALE: f64 = 1e7;

type XmlTags = Vec<(String, String)>;

struct OsmNode {
    id: i64,
    location: Location,
    tags: XmlTags,
}

struct OsmWay {
    id: i64,
    refs: Vec<i64>,
    tags: XmlTags,
}

struct OsmRelation {
    id: i64,
    members: Vec<(i64, &'static str)>,
    tags: XmlTags,
}

/// Topology document built from OSW features
#[derive(Default)]
pub struct OsmDocument {
    nodes: Vec<OsmNode>,
    ways: Vec<OsmWay>,
    relations: Vec<OsmRelation>,
    node_at: HashMap<(i64, i64), i64>,
    used_ids: HashSet<i64>,
    last_synthetic: i64,
}

impl OsmDocument {
    /// Builds the document from a list of GeoJSON features.
    ///
    /// Point features are placed first so that line and polygon vertices
    /// reuse them when the coordinates match.
    pub fn from_features(features: &[Value]) -> Result<Self> {
        let mut document = Self::default();
        let mut shapes = Vec::new();

        for feature in features {
            let Some(geometry) = feature.get("geometry").filter(|g| !g.is_null()) else {
                warn!("Skipping feature without geometry");
                continue;
            };
            let properties = match feature.get("properties") {
                Some(Value::Object(properties)) => properties.clone(),
                _ => Properties::new(),
            };

            match json_to_geometry(geometry)? {
                Geometry::Point(point) => document.add_point(point, &properties),
                other => shapes.push((other, properties)),
            }
        }

        for (geometry, properties) in shapes {
            match geometry {
                Geometry::LineString(line) => {
                    let id = document.feature_id(&properties);
                    document.add_way(id, &line, osm_tags(&properties));
                }
                Geometry::Polygon(polygon) => document.add_polygons(&[polygon], &properties),
                Geometry::MultiPolygon(multi) => document.add_polygons(&multi.0, &properties),
                _ => warn!("Skipping feature with unsupported geometry"),
            }
        }

        Ok(document)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    fn synthetic_id(&mut self) -> i64 {
        self.last_synthetic -= 1;
        self.last_synthetic
    }

    /// The feature's integer `_id` when it has an unused one, a synthetic id otherwise
    fn feature_id(&mut self, properties: &Properties) -> i64 {
        match properties.get("_id").and_then(Value::as_i64) {
            Some(id) if id > 0 && self.used_ids.insert(id) => id,
            _ => self.synthetic_id(),
        }
    }

    fn add_point(&mut self, point: Point<f64>, properties: &Properties) {
        let id = self.feature_id(properties);
        self.node_at.entry(coord_key(point.0)).or_insert(id);
        self.nodes.push(OsmNode {
            id,
            location: Location::new(point.x(), point.y()),
            tags: osm_tags(properties),
        });
    }

    /// Node at `coord`, created untagged when no node is there yet
    fn node_for(&mut self, coord: Coord<f64>) -> i64 {
        if let Some(&id) = self.node_at.get(&coord_key(coord)) {
            return id;
        }
        let id = self.synthetic_id();
        self.node_at.insert(coord_key(coord), id);
        self.nodes.push(OsmNode {
            id,
            location: Location::new(coord.x, coord.y),
            tags: XmlTags::new(),
        });
        id
    }

    fn add_way(&mut self, id: i64, line: &LineString<f64>, tags: XmlTags) -> i64 {
        let refs = line.coords().map(|c| self.node_for(*c)).collect();
        self.ways.push(OsmWay { id, refs, tags });
        id
    }

    /// A single simple polygon is a tagged closed way; holes or several
    /// polygons need a multipolygon relation carrying the tags.
    fn add_polygons(&mut self, polygons: &[Polygon<f64>], properties: &Properties) {
        let tags = osm_tags(properties);
        if let [polygon] = polygons {
            if polygon.interiors().is_empty() {
                let id = self.feature_id(properties);
                self.add_way(id, polygon.exterior(), tags);
                return;
            }
        }

        let mut members = Vec::new();
        for polygon in polygons {
            let id = self.synthetic_id();
            members.push((self.add_way(id, polygon.exterior(), XmlTags::new()), "outer"));
            for ring in polygon.interiors() {
                let id = self.synthetic_id();
                members.push((self.add_way(id, ring, XmlTags::new()), "inner"));
            }
        }

        let mut relation_tags = vec![("type".to_string(), "multipolygon".to_string())];
        relation_tags.extend(tags.into_iter().filter(|(key, _)| key != "type"));
        let id = self.feature_id(properties);
        self.relations.push(OsmRelation {
            id,
            members,
            tags: relation_tags,
        });
    }

    /// Writes the document as OSM XML to `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::write(path, e))?;
        let mut xml = XmlOut {
            writer: Writer::new_with_indent(BufWriter::new(file), b' ', 2),
            path,
        };

        xml.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let root = start("osm", &[("version", "0.6"), ("generator", GENERATOR)]);
        xml.emit(Event::Start(root))?;

        for node in &self.nodes {
            let (id, lat, lon) = (
                node.id.to_string(),
                format!("{:.7}", node.location.lat),
                format!("{:.7}", node.location.lon),
            );
            let children = tag_elements(&node.tags);
            xml.element(start("node", &[("id", id.as_str()), ("lat", lat.as_str()), ("lon", lon.as_str())]), &children)?;
        }

        for way in &self.ways {
            let refs: Vec<String> = way.refs.iter().map(i64::to_string).collect();
            let mut children: Vec<BytesStart> = refs.iter().map(|r| start("nd", &[("ref", r.as_str())])).collect();
            children.extend(tag_elements(&way.tags));
            xml.element(start("way", &[("id", way.id.to_string().as_str())]), &children)?;
        }

        for relation in &self.relations {
            let refs: Vec<String> = relation.members.iter().map(|(id, _)| id.to_string()).collect();
            let mut children: Vec<BytesStart> = relation
                .members
                .iter()
                .zip(&refs)
                .map(|((_, role), r)| start("member", &[("type", "way"), ("ref", r.as_str()), ("role", *role)]))
                .collect();
            children.extend(tag_elements(&relation.tags));
            xml.element(start("relation", &[("id", relation.id.to_string().as_str())]), &children)?;
        }

        xml.emit(Event::End(BytesEnd::new("osm")))?;
        xml.writer
            .into_inner()
            .flush()
            .map_err(|e| Error::write(path, e))
    }
}

/// Fixed-point key matching coordinates at OSM precision
fn coord_key(coord: Coord<f64>) -> (i64, i64) {
    (
        (coord.x * COORD_SCALE).round() as i64,
        (coord.y * COORD_SCALE).round() as i64,
    )
}

/// Properties as OSM tags: booleans become yes/no, nulls and identifiers are dropped
fn osm_tags(properties: &Properties) -> XmlTags {
    properties
        .iter()
        .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::Bool(true) => "yes".to_string(),
                Value::Bool(false) => "no".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

fn start<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for &attribute in attributes {
        element.push_attribute(attribute);
    }
    element
}

fn tag_elements(tags: &XmlTags) -> Vec<BytesStart<'static>> {
    tags.iter()
        .map(|(k, v)| start("tag", &[("k", k.as_str()), ("v", v.as_str())]))
        .collect()
}

struct XmlOut<'p, W: Write> {
    writer: Writer<W>,
    path: &'p Path,
}

impl<W: Write> XmlOut<'_, W> {
    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::write(self.path, io::Error::new(io::ErrorKind::Other, e.to_string())))
    }

    /// `element` alone when it has no children, wrapped around them otherwise
    fn element(&mut self, element: BytesStart<'_>, children: &[BytesStart<'_>]) -> Result<()> {
        if children.is_empty() {
            return self.emit(Event::Empty(element));
        }
        let end = element.to_end().into_owned();
        self.emit(Event::Start(element))?;
        for child in children {
            self.emit(Event::Empty(child.clone()))?;
        }
        self.emit(Event::End(end))
    }
}

/// Encodes the merged collection at `merged` as an OSM XML document at `output`
pub fn encode_osm(merged: &Path, output: &Path) -> Result<()> {
    let features = read_feature_collection(merged)?;
    let document = OsmDocument::from_features(&features)?;
    document.write(output)?;

    info!(
        "Encoded {} nodes, {} ways, {} relations to {}",
        document.node_count(),
        document.way_count(),
        document.relation_count(),
        output.display()
    );
    Ok(())
}
