//! Stat catalog - the static list of stat definitions

use once_cell::sync::Lazy;

use super::models::{StatDefinition, StatUnit};

/// Stats recorded by the lighting render wrapper
pub static DEFAULT_STATS: Lazy<Vec<StatDefinition>> = Lazy::new(|| {
    vec![
        StatDefinition::new("render time", StatUnit::Time, &[]),
        StatDefinition::new("memory", StatUnit::Size, &["texture", "geometry", "cache"]),
        StatDefinition::new("cpu utilization", StatUnit::Ratio, &[]),
    ]
});

/// Ordered, immutable set of stat definitions
#[derive(Debug, Clone, PartialEq)]
pub struct StatCatalog {
    definitions: Vec<StatDefinition>,
}

impl Default for StatCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_STATS.clone())
    }
}

impl StatCatalog {
    /// Build a catalog, keeping the first definition when a name repeats
    pub fn new(definitions: Vec<StatDefinition>) -> Self {
        let mut unique: Vec<StatDefinition> = Vec::with_capacity(definitions.len());
        for def in definitions {
            if unique.iter().any(|d| d.name == def.name) {
                tracing::warn!("Duplicate stat definition ignored: {}", def.name);
                continue;
            }
            unique.push(def);
        }
        Self {
            definitions: unique,
        }
    }

    pub fn get(&self, name: &str) -> Option<&StatDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    pub fn definitions(&self) -> &[StatDefinition] {
        &self.definitions
    }

    /// First stat in the catalog, used when nothing else is selected
    pub fn first(&self) -> Option<&StatDefinition> {
        self.definitions.first()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
