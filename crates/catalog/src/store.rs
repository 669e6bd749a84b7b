use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{CatalogError, Location, parse_locations_json};

/// Anything that can hand the engine its current set of locations.
pub trait LocationSource {
    fn locations(&self) -> Result<Vec<Location>, CatalogError>;
}

pub trait LocationStore: LocationSource {
    fn get(&self, id: &str) -> Result<Option<Location>, CatalogError>;
    fn upsert(&mut self, location: Location) -> Result<(), CatalogError>;
    fn delete(&mut self, id: &str) -> Result<bool, CatalogError>;
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub entries: BTreeMap<String, Location>,
}

/// Keyed by id; `locations()` lists in id order.
#[derive(Debug, Default)]
pub struct InMemoryLocationStore {
    snapshot: LocationSnapshot,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_locations(locations: impl IntoIterator<Item = Location>) -> Self {
        let mut store = Self::new();
        for location in locations {
            store.snapshot.entries.insert(location.id.clone(), location);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.snapshot.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.entries.is_empty()
    }

    /// Like [`LocationStore::get`] but a missing id is an error.
    pub fn require(&self, id: &str) -> Result<Location, CatalogError> {
        self.get(id)?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }
}

impl LocationSource for InMemoryLocationStore {
    fn locations(&self) -> Result<Vec<Location>, CatalogError> {
        Ok(self.snapshot.entries.values().cloned().collect())
    }
}

impl LocationStore for InMemoryLocationStore {
    fn get(&self, id: &str) -> Result<Option<Location>, CatalogError> {
        Ok(self.snapshot.entries.get(id).cloned())
    }

    fn upsert(&mut self, location: Location) -> Result<(), CatalogError> {
        self.snapshot.entries.insert(location.id.clone(), location);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, CatalogError> {
        Ok(self.snapshot.entries.remove(id).is_some())
    }
}

/// A JSON array of locations on disk, read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocationSource for JsonFileSource {
    fn locations(&self) -> Result<Vec<Location>, CatalogError> {
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| CatalogError::Io(format!("read {:?}: {e}", self.path)))?;
        parse_locations_json(&json)
    }
}
