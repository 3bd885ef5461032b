//! In-memory reference backend for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use relic_types::{Attachable, StoreError, StoreResult};

use crate::names::glob_match;
use crate::traits::RefBackend;
use crate::types::{RefTarget, Reference};

/// An in-memory implementation of [`RefBackend`].
///
/// Refs live in a `BTreeMap` behind a `RwLock`, so listings come out
/// sorted for free. Data is lost when the backend is freed or dropped.
pub struct MemoryRefBackend {
    refs: RwLock<BTreeMap<String, RefTarget>>,
}

impl MemoryRefBackend {
    /// Create a new empty ref backend.
    pub fn new() -> Self {
        Self {
            refs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of refs currently stored.
    pub fn len(&self) -> usize {
        self.refs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no refs are stored.
    pub fn is_empty(&self) -> bool {
        self.refs.read().expect("lock poisoned").is_empty()
    }
}

impl Default for MemoryRefBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Attachable for MemoryRefBackend {
    fn free(&self) {
        self.refs.write().expect("lock poisoned").clear();
    }
}

impl RefBackend for MemoryRefBackend {
    fn lookup(&self, name: &str) -> StoreResult<Reference> {
        let refs = self.refs.read().expect("lock poisoned");
        refs.get(name)
            .map(|target| Reference {
                name: name.to_string(),
                target: target.clone(),
            })
            .ok_or_else(|| StoreError::RefNotFound(name.to_string()))
    }

    fn set(&self, reference: &Reference) -> StoreResult<()> {
        let mut refs = self.refs.write().expect("lock poisoned");
        refs.insert(reference.name.clone(), reference.target.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let mut refs = self.refs.write().expect("lock poisoned");
        Ok(refs.remove(name).is_some())
    }

    fn iter(&self, glob: Option<&str>) -> StoreResult<Vec<Reference>> {
        let refs = self.refs.read().expect("lock poisoned");
        Ok(refs
            .iter()
            .filter(|(name, _)| glob.map_or(true, |pattern| glob_match(pattern, name.as_str())))
            .map(|(name, target)| Reference {
                name: name.clone(),
                target: target.clone(),
            })
            .collect())
    }

    fn compress(&self) -> StoreResult<()> {
        // Nothing to compact in a flat map; the pass still reports how much
        // it covered.
        let count = self.len();
        tracing::debug!(refs = count, "memory ref backend compacted");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryRefBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRefBackend")
            .field("ref_count", &self.len())
            .finish()
    }
}
