//! Polygon normalizer - building footprints

use crate::core::Result;
use crate::osm::Tags;

use super::canonical::text;
use super::{apply, unrecognized, FeatureKind, KeepKey, Normalizer, Properties, TagLookup};

const BUILDING_KEYS: &[KeepKey] = &[
    KeepKey::new("building", text),
    KeepKey::new("name", text),
    KeepKey::new("description", text),
];

pub struct PolygonNormalizer<'a> {
    tags: TagLookup<'a>,
    raw: &'a Tags,
}

impl PolygonNormalizer<'_> {
    pub fn is_building(&self) -> bool {
        self.tags.get_str("building").is_some_and(|v| v != "no")
    }
}

impl<'a> Normalizer<'a> for PolygonNormalizer<'a> {
    const KIND: FeatureKind = FeatureKind::Polygon;

    fn new(tags: &'a Tags) -> Self {
        Self {
            tags: TagLookup::new(tags),
            raw: tags,
        }
    }

    fn filter(&self) -> bool {
        self.is_building()
    }

    fn normalize(&self) -> Result<Properties> {
        if self.is_building() {
            Ok(apply(self.tags, &[BUILDING_KEYS], &[]))
        } else {
            Err(unrecognized(Self::KIND, self.raw))
        }
    }
}
