//! Tag lookup utility for normalizers
//!
//! Provides convenient access to raw OSM tags during classification.

use crate::osm::Tags;

/// Helper for looking up raw tags by key
#[derive(Clone, Copy)]
pub struct TagLookup<'a> {
    tags: &'a Tags,
}

impl<'a> TagLookup<'a> {
    pub fn new(tags: &'a Tags) -> Self {
        Self { tags }
    }

    /// Get a tag value by key name
    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Check if `key` is set to exactly `value`
    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get_str(key) == Some(value)
    }

    /// Check if `key` is set to one of `values`
    pub fn is_one_of(&self, key: &str, values: &[&str]) -> bool {
        self.get_str(key).is_some_and(|v| values.contains(&v))
    }

    /// Keys in the `ext:` namespace, passed through verbatim
    pub fn extensions(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.tags
            .iter()
            .filter(|(k, _)| k.starts_with("ext:"))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
