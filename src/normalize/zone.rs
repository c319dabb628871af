//! Zone normalizer - walkable areas

use crate::core::Result;
use crate::osm::Tags;

use super::canonical::{surface_value, text};
use super::{apply, unrecognized, FeatureKind, KeepKey, Normalizer, Properties, TagLookup};

const ZONE_KEYS: &[KeepKey] = &[
    KeepKey::new("highway", text),
    KeepKey::new("surface", surface_value),
    KeepKey::new("name", text),
    KeepKey::new("description", text),
    KeepKey::new("foot", text),
];

pub struct ZoneNormalizer<'a> {
    tags: TagLookup<'a>,
    raw: &'a Tags,
}

impl ZoneNormalizer<'_> {
    pub fn is_pedestrian(&self) -> bool {
        self.tags.is("highway", "pedestrian")
    }
}

impl<'a> Normalizer<'a> for ZoneNormalizer<'a> {
    const KIND: FeatureKind = FeatureKind::Zone;

    fn new(tags: &'a Tags) -> Self {
        Self {
            tags: TagLookup::new(tags),
            raw: tags,
        }
    }

    fn filter(&self) -> bool {
        self.is_pedestrian()
    }

    fn normalize(&self) -> Result<Properties> {
        if self.is_pedestrian() {
            Ok(apply(self.tags, &[ZONE_KEYS], &[]))
        } else {
            Err(unrecognized(Self::KIND, self.raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::tags_from;
    use serde_json::json;

    #[test]
    fn test_normalize_pedestrian_zone() {
        let tags = tags_from([("highway", "pedestrian"), ("area", "yes"), ("surface", "sett")]);
        let output = ZoneNormalizer::new(&tags).normalize().unwrap();
        assert_eq!(
            serde_json::Value::Object(output),
            json!({"highway": "pedestrian", "surface": "paving_stones"})
        );
    }

    #[test]
    fn test_landuse_is_not_a_zone() {
        let tags = tags_from([("landuse", "residential")]);
        assert!(!ZoneNormalizer::new(&tags).filter());
    }
}
