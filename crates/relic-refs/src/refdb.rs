//! The reference database: a single active backend behind a uniform
//! interface.
//!
//! A reference store has exactly one source of truth at a time, so unlike
//! the object database there is no chain: [`ReferenceDatabase::set_backend`]
//! replaces the active backend. Replacement does not free the previous
//! backend; it is handed back to the caller, who decides its fate.
//! Every operation invoked before a backend is set fails fast with
//! `NoBackend`.

use tracing::debug;

use relic_types::{Attached, StoreError, StoreResult};

use crate::names::validate_refname;
use crate::traits::{RefBackend, RefHandle};
use crate::types::{RefTarget, Reference};

/// A mutable name→target store backed by one pluggable backend.
pub struct ReferenceDatabase {
    backend: Option<Attached<dyn RefBackend>>,
}

impl ReferenceDatabase {
    /// Create a database with no backend set.
    pub fn new() -> Self {
        Self { backend: None }
    }

    /// Returns `true` if a backend is set.
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Set the active backend, taking ownership of it.
    ///
    /// Fails with `BackendReused` under the same rule as the object
    /// database, leaving any current backend in place. On success the
    /// previous backend, if any, is returned still-attached: this database
    /// no longer owns it, and releasing it is the caller's explicit
    /// decision.
    pub fn set_backend(
        &mut self,
        handle: &RefHandle,
    ) -> StoreResult<Option<Attached<dyn RefBackend>>> {
        let backend = handle.claim()?;
        debug!(replacing = self.backend.is_some(), "ref backend set");
        Ok(self.backend.replace(backend))
    }

    fn active(&self) -> StoreResult<&Attached<dyn RefBackend>> {
        self.backend.as_ref().ok_or(StoreError::NoBackend)
    }

    /// Read a reference by name.
    pub fn lookup(&self, name: &str) -> StoreResult<Reference> {
        self.active()?.lookup(name)
    }

    /// Create or update a reference.
    ///
    /// The name is validated first; a symbolic target's referent name is
    /// validated too.
    pub fn set(&self, name: &str, target: RefTarget) -> StoreResult<()> {
        validate_refname(name)?;
        if let RefTarget::Symbolic(referent) = &target {
            validate_refname(referent)?;
        }
        self.active()?.set(&Reference {
            name: name.to_string(),
            target,
        })
    }

    /// Delete a reference. Returns `Ok(true)` if it existed.
    pub fn delete(&self, name: &str) -> StoreResult<bool> {
        self.active()?.delete(name)
    }

    /// List references matching a glob pattern (`None` lists everything),
    /// sorted by name.
    pub fn iter(&self, glob: Option<&str>) -> StoreResult<Vec<Reference>> {
        self.active()?.iter(glob)
    }

    /// Run the backend's maintenance/compaction pass.
    pub fn compress(&self) -> StoreResult<()> {
        debug!("ref database compress requested");
        self.active()?.compress()
    }
}

impl Default for ReferenceDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ReferenceDatabase {
    fn drop(&mut self) {
        if let Some(backend) = &self.backend {
            backend.release();
        }
    }
}

impl std::fmt::Debug for ReferenceDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceDatabase")
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}
