use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use wqi_core::ParameterSet;

use crate::builtin::builtin_sets;
use crate::error::CatalogError;

/// Immutable registry of parameter sets, selected by name per request.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sets: BTreeMap<String, Arc<ParameterSet>>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    parameter_sets: Vec<ParameterSet>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Self::empty();
        for set in builtin_sets()? {
            catalog.insert(set);
        }
        Ok(catalog)
    }

    /// Adds a set, replacing any set with the same name.
    pub fn insert(&mut self, set: ParameterSet) -> Option<Arc<ParameterSet>> {
        self.sets.insert(set.name().to_string(), Arc::new(set))
    }

    /// Merges the sets of a JSON document of the form
    /// `{"parameter_sets": [...]}`. Returns how many sets were loaded.
    pub fn extend_from_json(&mut self, raw: &str) -> Result<usize, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let count = file.parameter_sets.len();
        for set in file.parameter_sets {
            let name = set.name().to_string();
            if self.insert(set).is_some() {
                info!(set = name.as_str(), "parameter set replaced from catalog file");
            }
        }
        Ok(count)
    }

    pub fn load_json_file(&mut self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let count = self.extend_from_json(&raw)?;
        info!(path = %path.display(), count, "loaded parameter sets");
        Ok(count)
    }

    /// Exact match first, then ASCII case-insensitive.
    pub fn get(&self, name: &str) -> Option<Arc<ParameterSet>> {
        let trimmed = name.trim();
        self.sets.get(trimmed).cloned().or_else(|| {
            self.sets
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(trimmed))
                .map(|(_, set)| Arc::clone(set))
        })
    }

    pub fn require(&self, name: &str) -> Result<Arc<ParameterSet>, CatalogError> {
        self.get(name)
            .ok_or_else(|| CatalogError::UnknownSet(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ParameterSet>> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
