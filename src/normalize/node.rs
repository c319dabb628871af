//! Node normalizer - kerbs on the pedestrian network

use crate::core::Result;
use crate::osm::Tags;

use super::canonical::{tactile_paving_value, text};
use super::{apply, unrecognized, FeatureKind, KeepKey, Normalizer, Properties, TagLookup};

const KERB_VALUES: &[&str] = &["flush", "lowered", "rolled", "raised"];

const KERB_KEYS: &[KeepKey] = &[
    KeepKey::new("kerb", text),
    KeepKey::new("barrier", text),
    KeepKey::new("tactile_paving", tactile_paving_value),
];

pub struct NodeNormalizer<'a> {
    tags: TagLookup<'a>,
    raw: &'a Tags,
}

impl NodeNormalizer<'_> {
    pub fn is_kerb(&self) -> bool {
        self.tags.is_one_of("kerb", KERB_VALUES)
    }
}

impl<'a> Normalizer<'a> for NodeNormalizer<'a> {
    const KIND: FeatureKind = FeatureKind::Node;

    fn new(tags: &'a Tags) -> Self {
        Self {
            tags: TagLookup::new(tags),
            raw: tags,
        }
    }

    fn filter(&self) -> bool {
        self.is_kerb()
    }

    fn normalize(&self) -> Result<Properties> {
        if self.is_kerb() {
            Ok(apply(self.tags, &[KERB_KEYS], &[("barrier", "kerb")]))
        } else {
            Err(unrecognized(Self::KIND, self.raw))
        }
    }
}
