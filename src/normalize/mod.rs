//! OpenSidewalks tag normalization
//!
//! One normalizer per feature kind. Each classifies a raw tag set (the same
//! predicates drive the parser inclusion filters) and maps it onto the OSW
//! output vocabulary through the shared functions in [`canonical`].

pub mod canonical;
pub mod line;
pub mod node;
pub mod point;
pub mod polygon;
pub mod tag_lookup;
pub mod way;
pub mod zone;

use std::fmt;

use serde_json::{Map, Value};

use crate::core::{Error, Result};
use crate::osm::{EntityType, Tags};

pub use canonical::Converter;
pub use line::LineNormalizer;
pub use node::NodeNormalizer;
pub use point::PointNormalizer;
pub use polygon::PolygonNormalizer;
pub use tag_lookup::TagLookup;
pub use way::WayNormalizer;
pub use zone::ZoneNormalizer;

/// Normalized tag mapping, as written to GeoJSON properties
pub type Properties = Map<String, Value>;

/// Target feature kinds of the OSW schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    Way,
    Node,
    Point,
    Line,
    Zone,
    Polygon,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 6] = [
        FeatureKind::Way,
        FeatureKind::Node,
        FeatureKind::Point,
        FeatureKind::Line,
        FeatureKind::Zone,
        FeatureKind::Polygon,
    ];

    /// Raw entity type visited by this kind's parser
    pub fn entity_type(self) -> EntityType {
        match self {
            FeatureKind::Way | FeatureKind::Line => EntityType::Way,
            FeatureKind::Node | FeatureKind::Point => EntityType::Node,
            FeatureKind::Zone | FeatureKind::Polygon => EntityType::Area,
        }
    }

    /// Whether `tags` matches any classification of this kind
    pub fn classify(self, tags: &Tags) -> bool {
        match self {
            FeatureKind::Way => WayNormalizer::new(tags).filter(),
            FeatureKind::Node => NodeNormalizer::new(tags).filter(),
            FeatureKind::Point => PointNormalizer::new(tags).filter(),
            FeatureKind::Line => LineNormalizer::new(tags).filter(),
            FeatureKind::Zone => ZoneNormalizer::new(tags).filter(),
            FeatureKind::Polygon => PolygonNormalizer::new(tags).filter(),
        }
    }

    /// Normalizes `tags` with this kind's normalizer
    pub fn normalize(self, tags: &Tags) -> Result<Properties> {
        match self {
            FeatureKind::Way => WayNormalizer::new(tags).normalize(),
            FeatureKind::Node => NodeNormalizer::new(tags).normalize(),
            FeatureKind::Point => PointNormalizer::new(tags).normalize(),
            FeatureKind::Line => LineNormalizer::new(tags).normalize(),
            FeatureKind::Zone => ZoneNormalizer::new(tags).normalize(),
            FeatureKind::Polygon => PolygonNormalizer::new(tags).normalize(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::Way => "way",
            FeatureKind::Node => "node",
            FeatureKind::Point => "point",
            FeatureKind::Line => "line",
            FeatureKind::Zone => "zone",
            FeatureKind::Polygon => "polygon",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification and normalization of one feature kind
pub trait Normalizer<'a>: Sized {
    const KIND: FeatureKind;

    fn new(tags: &'a Tags) -> Self;

    /// True when at least one classification predicate holds
    fn filter(&self) -> bool;

    /// Maps the raw tags onto the output vocabulary
    fn normalize(&self) -> Result<Properties>;
}

/// A raw key kept in the output, renamed to `output` and converted
#[derive(Clone, Copy)]
pub struct KeepKey {
    pub raw: &'static str,
    pub output: &'static str,
    pub convert: Converter,
}

impl KeepKey {
    pub const fn new(raw: &'static str, convert: Converter) -> Self {
        Self {
            raw,
            output: raw,
            convert,
        }
    }

    pub const fn renamed(raw: &'static str, output: &'static str, convert: Converter) -> Self {
        Self { raw, output, convert }
    }
}

/// Applies keep keys in order, then `ext:*` keys, then defaults.
///
/// Defaults are applied last so classification constants overwrite any
/// generic value copied earlier.
pub fn apply(tags: TagLookup<'_>, keep: &[&[KeepKey]], defaults: &[(&str, &str)]) -> Properties {
    let mut output = Properties::new();

    for key in keep.iter().flat_map(|group| group.iter()) {
        if let Some(value) = tags.get_str(key.raw).and_then(key.convert) {
            output.insert(key.output.to_string(), value);
        }
    }

    for (key, value) in tags.extensions() {
        output.insert(key.to_string(), Value::from(value));
    }

    for (key, value) in defaults {
        output.insert(key.to_string(), Value::from(*value));
    }

    output
}

pub(crate) fn unrecognized(kind: FeatureKind, tags: &Tags) -> Error {
    let summary = tags
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    Error::SchemaValidation(format!("not a valid OSW {kind}: {{{summary}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::tags_from;

    #[test]
    fn test_kind_entity_types() {
        assert_eq!(FeatureKind::Way.entity_type(), EntityType::Way);
        assert_eq!(FeatureKind::Line.entity_type(), EntityType::Way);
        assert_eq!(FeatureKind::Point.entity_type(), EntityType::Node);
        assert_eq!(FeatureKind::Polygon.entity_type(), EntityType::Area);
    }

    #[test]
    fn test_classify_dispatch() {
        assert!(FeatureKind::Way.classify(&tags_from([("highway", "footway")])));
        assert!(FeatureKind::Node.classify(&tags_from([("kerb", "lowered")])));
        assert!(FeatureKind::Point.classify(&tags_from([("power", "pole")])));
        assert!(FeatureKind::Line.classify(&tags_from([("barrier", "fence")])));
        assert!(FeatureKind::Zone.classify(&tags_from([("highway", "pedestrian")])));
        assert!(FeatureKind::Polygon.classify(&tags_from([("building", "yes")])));
        assert!(!FeatureKind::Polygon.classify(&tags_from([("building", "no")])));
    }

    #[test]
    fn test_defaults_overwrite_generic_values() {
        const KEEP: &[KeepKey] = &[KeepKey::new("barrier", canonical::text)];
        let raw = tags_from([("barrier", "gate"), ("ext:note", "x")]);
        let output = apply(TagLookup::new(&raw), &[KEEP], &[("barrier", "kerb")]);
        assert_eq!(output.get("barrier"), Some(&Value::from("kerb")));
        assert_eq!(output.get("ext:note"), Some(&Value::from("x")));
    }

    #[test]
    fn test_unrecognized_is_schema_error() {
        let err = FeatureKind::Way
            .normalize(&tags_from([("highway", "invalid_type")]))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaValidation(_)));
    }
}
