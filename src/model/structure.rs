use super::value::SiteValue;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub species: String,
    pub position: [f64; 3],
    pub label: Option<String>,
    pub properties: BTreeMap<String, SiteValue>,
}

impl Site {
    pub fn new(species: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            species: species.into(),
            position,
            label: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: SiteValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// An ordered, fully materialized atomic structure.
///
/// Site order is significant: every per-site array produced by the resolver
/// is aligned with [`Structure::sites`]. Species need not be contiguous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    pub lattice: Option<[[f64; 3]; 3]>,
    pub sites: Vec<Site>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sites(sites: Vec<Site>) -> Self {
        Self {
            lattice: None,
            sites,
        }
    }

    #[inline]
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Distinct species symbols in order of first appearance.
    pub fn species(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for site in &self.sites {
            if !seen.contains(&site.species.as_str()) {
                seen.push(&site.species);
            }
        }
        seen
    }

    pub fn has_species(&self, symbol: &str) -> bool {
        self.sites.iter().any(|s| s.species == symbol)
    }

    pub fn site_index(&self, label: &str) -> Option<usize> {
        self.sites
            .iter()
            .position(|s| s.label.as_deref() == Some(label))
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.site_index(label).is_some()
    }

    /// Returns the named per-site metadata column, or `None` unless every
    /// site carries a value for it.
    pub fn column(&self, name: &str) -> Option<Vec<SiteValue>> {
        self.sites
            .iter()
            .map(|site| site.properties.get(name).copied())
            .collect()
    }
}
