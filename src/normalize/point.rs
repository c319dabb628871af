//! Point normalizer - street furniture and utilities standing on their own

use crate::core::Result;
use crate::osm::Tags;

use super::canonical::text;
use super::{apply, unrecognized, FeatureKind, KeepKey, Normalizer, Properties, TagLookup};

const DESCRIPTIVE_KEYS: &[KeepKey] = &[KeepKey::new("name", text), KeepKey::new("description", text)];

/// `(key, value)` pairs identifying each point class; the pair itself is the output
const POINT_CLASSES: &[(&str, &str)] = &[
    ("power", "pole"),
    ("emergency", "fire_hydrant"),
    ("amenity", "bench"),
    ("amenity", "waste_basket"),
    ("man_made", "manhole"),
    ("barrier", "bollard"),
    ("highway", "street_lamp"),
];

pub struct PointNormalizer<'a> {
    tags: TagLookup<'a>,
    raw: &'a Tags,
}

impl PointNormalizer<'_> {
    pub fn is_powerpole(&self) -> bool {
        self.tags.is("power", "pole")
    }

    pub fn is_fire_hydrant(&self) -> bool {
        self.tags.is("emergency", "fire_hydrant")
    }

    pub fn is_bench(&self) -> bool {
        self.tags.is("amenity", "bench")
    }

    pub fn is_waste_basket(&self) -> bool {
        self.tags.is("amenity", "waste_basket")
    }

    pub fn is_manhole(&self) -> bool {
        self.tags.is("man_made", "manhole")
    }

    pub fn is_bollard(&self) -> bool {
        self.tags.is("barrier", "bollard")
    }

    pub fn is_street_lamp(&self) -> bool {
        self.tags.is("highway", "street_lamp")
    }

    fn class(&self) -> Option<(&'static str, &'static str)> {
        POINT_CLASSES
            .iter()
            .find(|(key, value)| self.tags.is(key, value))
            .copied()
    }
}

impl<'a> Normalizer<'a> for PointNormalizer<'a> {
    const KIND: FeatureKind = FeatureKind::Point;

    fn new(tags: &'a Tags) -> Self {
        Self {
            tags: TagLookup::new(tags),
            raw: tags,
        }
    }

    fn filter(&self) -> bool {
        self.class().is_some()
    }

    fn normalize(&self) -> Result<Properties> {
        let class = self.class().ok_or_else(|| unrecognized(Self::KIND, self.raw))?;
        Ok(apply(self.tags, &[DESCRIPTIVE_KEYS], &[class]))
    }
}
