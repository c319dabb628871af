//! Way normalizer - pedestrian paths, crossings and the streets that carry them

use crate::core::Result;
use crate::osm::Tags;

use super::canonical::{self, climb_value, crossing_markings_value, crossing_value, float, int, surface_value, text};
use super::{apply, unrecognized, FeatureKind, KeepKey, Normalizer, Properties, TagLookup};

/// Street classes kept as OSW roads
const ROAD_HIGHWAY_VALUES: &[&str] = &[
    "primary",
    "secondary",
    "tertiary",
    "residential",
    "unclassified",
    "trunk",
    "service",
];

const GENERIC_KEYS: &[KeepKey] = &[
    KeepKey::new("highway", text),
    KeepKey::new("width", float),
    KeepKey::new("surface", surface_value),
    KeepKey::new("name", text),
    KeepKey::new("description", text),
    KeepKey::new("foot", text),
    KeepKey::new("incline", canonical::incline),
    KeepKey::new("length", float),
];

const FOOTWAY_KEYS: &[KeepKey] = &[KeepKey::new("footway", text)];

const CROSSING_KEYS: &[KeepKey] = &[
    KeepKey::new("footway", text),
    KeepKey::new("crossing", crossing_value),
    KeepKey::new("crossing:markings", crossing_markings_value),
];

// Stairs report `incline` as `climb`, up or down only
const STAIRS_KEYS: &[KeepKey] = &[
    KeepKey::new("highway", text),
    KeepKey::new("width", float),
    KeepKey::new("surface", surface_value),
    KeepKey::new("name", text),
    KeepKey::new("description", text),
    KeepKey::new("foot", text),
    KeepKey::new("length", float),
    KeepKey::new("step_count", int),
    KeepKey::renamed("incline", "climb", climb_value),
];

const SERVICE_KEYS: &[KeepKey] = &[KeepKey::new("service", text)];

/// Classification of an OSW edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WayClass {
    Sidewalk,
    Crossing,
    TrafficIsland,
    Footway,
    Stairs,
    Pedestrian,
    LivingStreet,
    Driveway,
    Alley,
    ParkingAisle,
    Road,
    Cycleway,
    Path,
}

pub struct WayNormalizer<'a> {
    tags: TagLookup<'a>,
    raw: &'a Tags,
}

impl<'a> WayNormalizer<'a> {
    pub fn is_sidewalk(&self) -> bool {
        self.tags.is("highway", "footway") && self.tags.is("footway", "sidewalk")
    }

    pub fn is_crossing(&self) -> bool {
        self.tags.is("highway", "footway") && self.tags.is("footway", "crossing")
    }

    pub fn is_traffic_island(&self) -> bool {
        self.tags.is("highway", "footway") && self.tags.is("footway", "traffic_island")
    }

    pub fn is_footway(&self) -> bool {
        self.tags.is("highway", "footway")
    }

    pub fn is_stairs(&self) -> bool {
        self.tags.is("highway", "steps")
    }

    /// Pedestrian streets; pedestrian areas are zones, not edges
    pub fn is_pedestrian(&self) -> bool {
        self.tags.is("highway", "pedestrian") && !self.tags.is("area", "yes")
    }

    pub fn is_living_street(&self) -> bool {
        self.tags.is("highway", "living_street")
    }

    pub fn is_driveway(&self) -> bool {
        self.tags.is("highway", "service") && self.tags.is("service", "driveway")
    }

    pub fn is_alley(&self) -> bool {
        self.tags.is("highway", "service") && self.tags.is("service", "alley")
    }

    pub fn is_parking_aisle(&self) -> bool {
        self.tags.is("highway", "service") && self.tags.is("service", "parking_aisle")
    }

    pub fn is_road(&self) -> bool {
        self.tags.is_one_of("highway", ROAD_HIGHWAY_VALUES)
    }

    pub fn is_cycleway(&self) -> bool {
        self.tags.is("highway", "cycleway")
    }

    pub fn is_path(&self) -> bool {
        self.tags.is("highway", "path")
    }

    /// Most specific class first
    pub fn classification(&self) -> Option<WayClass> {
        let checks: [(fn(&Self) -> bool, WayClass); 13] = [
            (Self::is_sidewalk, WayClass::Sidewalk),
            (Self::is_crossing, WayClass::Crossing),
            (Self::is_traffic_island, WayClass::TrafficIsland),
            (Self::is_footway, WayClass::Footway),
            (Self::is_stairs, WayClass::Stairs),
            (Self::is_pedestrian, WayClass::Pedestrian),
            (Self::is_living_street, WayClass::LivingStreet),
            (Self::is_driveway, WayClass::Driveway),
            (Self::is_alley, WayClass::Alley),
            (Self::is_parking_aisle, WayClass::ParkingAisle),
            (Self::is_road, WayClass::Road),
            (Self::is_cycleway, WayClass::Cycleway),
            (Self::is_path, WayClass::Path),
        ];
        checks.iter().find(|(check, _)| check(self)).map(|(_, class)| *class)
    }

    fn normalize_way(&self, keep: &[KeepKey], defaults: &[(&str, &str)]) -> Properties {
        apply(self.tags, &[GENERIC_KEYS, keep], defaults)
    }
}

impl<'a> Normalizer<'a> for WayNormalizer<'a> {
    const KIND: FeatureKind = FeatureKind::Way;

    fn new(tags: &'a Tags) -> Self {
        Self {
            tags: TagLookup::new(tags),
            raw: tags,
        }
    }

    fn filter(&self) -> bool {
        self.classification().is_some()
    }

    fn normalize(&self) -> Result<Properties> {
        let class = self
            .classification()
            .ok_or_else(|| unrecognized(Self::KIND, self.raw))?;

        Ok(match class {
            WayClass::Sidewalk => self.normalize_way(FOOTWAY_KEYS, &[("footway", "sidewalk")]),
            WayClass::Crossing => self.normalize_way(CROSSING_KEYS, &[("footway", "crossing")]),
            WayClass::TrafficIsland => self.normalize_way(FOOTWAY_KEYS, &[("footway", "traffic_island")]),
            WayClass::Footway => self.normalize_way(FOOTWAY_KEYS, &[]),
            WayClass::Stairs => apply(self.tags, &[STAIRS_KEYS], &[("highway", "steps")]),
            WayClass::Driveway => self.normalize_way(SERVICE_KEYS, &[("service", "driveway")]),
            WayClass::Alley => self.normalize_way(SERVICE_KEYS, &[("service", "alley")]),
            WayClass::ParkingAisle => self.normalize_way(SERVICE_KEYS, &[("service", "parking_aisle")]),
            WayClass::Pedestrian
            | WayClass::LivingStreet
            | WayClass::Road
            | WayClass::Cycleway
            | WayClass::Path => self.normalize_way(&[], &[]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::osm::tags_from;
    use serde_json::json;

    fn normalize(pairs: &[(&str, &str)]) -> Result<Properties> {
        let tags = tags_from(pairs.iter().copied());
        WayNormalizer::new(&tags).normalize()
    }

    #[test]
    fn test_normalize_sidewalk() {
        let output = normalize(&[
            ("highway", "footway"),
            ("footway", "sidewalk"),
            ("width", "1.5"),
            ("surface", "asphalt"),
        ])
        .unwrap();

        let expected = json!({
            "highway": "footway",
            "width": 1.5,
            "surface": "asphalt",
            "footway": "sidewalk",
        });
        assert_eq!(serde_json::Value::Object(output), expected);
    }

    #[test]
    fn test_normalize_crossing() {
        let output = normalize(&[("highway", "footway"), ("footway", "crossing")]).unwrap();
        assert_eq!(
            serde_json::Value::Object(output),
            json!({"highway": "footway", "footway": "crossing"})
        );

        let output = normalize(&[
            ("highway", "footway"),
            ("footway", "crossing"),
            ("crossing", "zebra"),
            ("crossing:markings", "dashes"),
            ("lit", "yes"),
        ])
        .unwrap();
        assert_eq!(output.get("crossing"), Some(&json!("marked")));
        assert_eq!(output.get("crossing:markings"), Some(&json!("dashes")));
        assert!(!output.contains_key("lit"));
    }

    #[test]
    fn test_invalid_way_is_schema_error() {
        let err = normalize(&[("highway", "invalid_type")]).unwrap_err();
        assert!(matches!(err, Error::SchemaValidation(_)));
    }

    #[test]
    fn test_unrecognized_values_are_dropped() {
        let output = normalize(&[("highway", "footway"), ("surface", "lava"), ("width", "wide")]).unwrap();
        assert_eq!(serde_json::Value::Object(output), json!({"highway": "footway"}));
    }

    #[test]
    fn test_stairs_use_climb() {
        let output = normalize(&[("highway", "steps"), ("incline", "up"), ("step_count", "12")]).unwrap();
        assert_eq!(output.get("climb"), Some(&json!("up")));
        assert_eq!(output.get("step_count"), Some(&json!(12)));
        assert!(!output.contains_key("incline"));
    }

    #[test]
    fn test_service_classes() {
        let output = normalize(&[("highway", "service"), ("service", "driveway")]).unwrap();
        assert_eq!(output.get("service"), Some(&json!("driveway")));

        let output = normalize(&[("highway", "service"), ("service", "emergency_access")]).unwrap();
        assert!(!output.contains_key("service"));
    }

    fn way(pairs: &[(&str, &str)]) -> Tags {
        tags_from(pairs.iter().copied())
    }

    #[test]
    fn test_predicates() {
        assert!(WayNormalizer::new(&way(&[("highway", "footway"), ("footway", "sidewalk")])).is_sidewalk());
        assert!(WayNormalizer::new(&way(&[("highway", "footway"), ("footway", "crossing")])).is_crossing());
        assert!(WayNormalizer::new(&way(&[("highway", "footway"), ("footway", "traffic_island")])).is_traffic_island());
        assert!(WayNormalizer::new(&way(&[("highway", "footway")])).is_footway());
        assert!(WayNormalizer::new(&way(&[("highway", "steps")])).is_stairs());
        assert!(WayNormalizer::new(&way(&[("highway", "pedestrian")])).is_pedestrian());
        assert!(!WayNormalizer::new(&way(&[("highway", "pedestrian"), ("area", "yes")])).is_pedestrian());
        assert!(WayNormalizer::new(&way(&[("highway", "cycleway")])).is_cycleway());
        assert!(WayNormalizer::new(&way(&[("highway", "living_street")])).is_living_street());
        assert!(WayNormalizer::new(&way(&[("highway", "path")])).is_path());
        assert!(WayNormalizer::new(&way(&[("highway", "residential")])).is_road());
        assert!(!WayNormalizer::new(&way(&[("highway", "motorway")])).is_road());
    }
}
