use super::tag::Tag;
use super::value::{RawValue, TagValue};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// An input document: tag keys in declaration order with their raw values.
///
/// Keys are stored exactly as written; duplicates (including case and alias
/// variants) are preserved so the normalizer can detect them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocument {
    entries: Vec<(String, RawValue)>,
}

impl RawDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: RawValue) {
        self.entries.push((key.into(), value));
    }

    pub fn with(mut self, key: impl Into<String>, value: RawValue) -> Self {
        self.push(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, RawValue)> for RawDocument {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    Explicit,
    FromDefault,
    Corrected,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Explicit => write!(f, "explicit"),
            Provenance::FromDefault => write!(f, "fromDefault"),
            Provenance::Corrected => write!(f, "corrected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    pub value: TagValue,
    pub provenance: Provenance,
}

impl TagEntry {
    pub fn new(value: TagValue, provenance: Provenance) -> Self {
        Self { value, provenance }
    }
}

/// The canonical tag set handed to emission.
///
/// Entries are keyed by canonical tag and iterate in sorted tag order, so
/// rendering is stable regardless of input key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedDocument {
    entries: BTreeMap<Tag, TagEntry>,
}

impl NormalizedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag, value: TagValue, provenance: Provenance) -> Option<TagEntry> {
        self.entries.insert(tag, TagEntry::new(value, provenance))
    }

    pub fn insert_entry(&mut self, tag: Tag, entry: TagEntry) -> Option<TagEntry> {
        self.entries.insert(tag, entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<TagEntry> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&TagEntry> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TagEntry> {
        self.entries.get_mut(name)
    }

    pub fn value(&self, name: &str) -> Option<&TagValue> {
        self.entries.get(name).map(|e| &e.value)
    }

    pub fn provenance(&self, name: &str) -> Option<Provenance> {
        self.entries.get(name).map(|e| e.provenance)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Tag, TagEntry> {
        self.entries.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.entries.keys()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for NormalizedDocument {
    type Item = (Tag, TagEntry);
    type IntoIter = btree_map::IntoIter<Tag, TagEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a NormalizedDocument {
    type Item = (&'a Tag, &'a TagEntry);
    type IntoIter = btree_map::Iter<'a, Tag, TagEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
