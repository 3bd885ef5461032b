//! The [`RefBackend`] trait defining the reference storage contract.
//!
//! Unlike the object database's backend chain, a reference database has
//! exactly one source of truth at a time; the backend behind it still
//! travels through the same ownership handle and is claimed exactly once.

use relic_types::{Attachable, BackendHandle, StoreResult};

use crate::types::Reference;

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync` via [`Attachable`])
/// and provide atomic read/write/delete of individual refs. Name
/// validation happens above this trait, in the reference database;
/// backends may assume names are well-formed.
pub trait RefBackend: Attachable {
    /// Read a reference by its full name.
    fn lookup(&self, name: &str) -> StoreResult<Reference>;

    /// Create or update a reference.
    fn set(&self, reference: &Reference) -> StoreResult<()>;

    /// Delete a reference by name.
    ///
    /// Returns `Ok(true)` if it existed, `Ok(false)` if it did not.
    fn delete(&self, name: &str) -> StoreResult<bool>;

    /// List references matching a glob pattern, sorted by name.
    ///
    /// `None` lists everything.
    fn iter(&self, glob: Option<&str>) -> StoreResult<Vec<Reference>>;

    /// Run a maintenance/compaction pass over the backend's storage.
    fn compress(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Handle type for reference backends.
pub type RefHandle = BackendHandle<dyn RefBackend>;
