//! Line normalizer - linear features without network semantics

use crate::core::Result;
use crate::osm::Tags;

use super::canonical::text;
use super::{apply, unrecognized, FeatureKind, KeepKey, Normalizer, Properties, TagLookup};

const FENCE_KEYS: &[KeepKey] = &[
    KeepKey::new("barrier", text),
    KeepKey::new("name", text),
    KeepKey::new("description", text),
];

pub struct LineNormalizer<'a> {
    tags: TagLookup<'a>,
    raw: &'a Tags,
}

impl LineNormalizer<'_> {
    pub fn is_fence(&self) -> bool {
        self.tags.is("barrier", "fence")
    }
}

impl<'a> Normalizer<'a> for LineNormalizer<'a> {
    const KIND: FeatureKind = FeatureKind::Line;

    fn new(tags: &'a Tags) -> Self {
        Self {
            tags: TagLookup::new(tags),
            raw: tags,
        }
    }

    fn filter(&self) -> bool {
        self.is_fence()
    }

    fn normalize(&self) -> Result<Properties> {
        if self.is_fence() {
            Ok(apply(self.tags, &[FENCE_KEYS], &[("barrier", "fence")]))
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
    fn test_normalize_fence() {
        let tags = tags_from([("barrier", "fence"), ("fence_type", "chain_link"), ("name", "Yard")]);
        let normalizer = LineNormalizer::new(&tags);
        assert!(normalizer.is_fence());
        assert_eq!(
            serde_json::Value::Object(normalizer.normalize().unwrap()),
            json!({"barrier": "fence", "name": "Yard"})
        );
    }

    #[test]
    fn test_railway_is_not_a_line() {
        let tags = tags_from([("railway", "light_rail")]);
        assert!(!LineNormalizer::new(&tags).filter());
        assert!(LineNormalizer::new(&tags).normalize().is_err());
    }
}
