//! The object database: a priority-ordered aggregation of backends.
//!
//! Callers attach backends at a priority and thereafter talk only to the
//! aggregator. Point lookups try backends in priority order (lower number
//! first, ties broken by attachment order) and recover locally from
//! misses; any harder failure short-circuits the fan-out unmodified.
//! Enumeration is a union: every backend is visited in attachment order
//! and duplicates are preserved.
//!
//! The backend list is mutated only by [`ObjectDatabase::add_backend`],
//! which takes `&mut self`; reads take `&self`. There is no internal
//! locking: the borrow checker enforces the single-writer discipline. A
//! deployment that wants to run a call on a worker thread takes an
//! [`OdbSnapshot`] first: an owned view that keeps every backend alive for
//! the duration of the call and is immune to list mutation racing it.

use std::path::{Path, PathBuf};

use tracing::debug;

use relic_types::{Attached, ObjectId, OidPrefix, StoreError, StoreResult};

use crate::backend::{Backend, Capabilities, OdbHandle};
use crate::config::OdbConfig;
use crate::object::{Object, ObjectHeader, ObjectKind};

#[derive(Clone)]
struct Slot {
    priority: i32,
    seq: u64,
    backend: Attached<dyn Backend>,
}

/// A content-addressed object store composed of prioritized backends.
pub struct ObjectDatabase {
    /// Sorted by `(priority, seq)`: the point-lookup try-order.
    slots: Vec<Slot>,
    next_seq: u64,
    root: Option<PathBuf>,
    config: OdbConfig,
}

impl ObjectDatabase {
    /// Create an empty database with default tunables.
    pub fn new() -> Self {
        Self::with_config(OdbConfig::default())
    }

    /// Create an empty database with the given tunables.
    pub fn with_config(config: OdbConfig) -> Self {
        Self {
            slots: Vec::new(),
            next_seq: 0,
            root: None,
            config,
        }
    }

    /// Open a database against a storage root.
    ///
    /// The root directory is created if absent and recorded for backends
    /// that want it; physical on-disk formats belong to the backends
    /// themselves.
    pub fn open(root: impl AsRef<Path>, config: OdbConfig) -> StoreResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let mut db = Self::with_config(config);
        db.root = Some(root.to_path_buf());
        debug!(root = %root.display(), "object database opened");
        Ok(db)
    }

    /// The storage root, if this database was opened against one.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The tunables this database was constructed with.
    pub fn config(&self) -> &OdbConfig {
        &self.config
    }

    /// Number of attached backends.
    pub fn backend_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no backend is attached.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Attach a backend at the given priority, taking ownership of it.
    ///
    /// Lower priority numbers are tried first; ties are broken by
    /// attachment order. Fails with `BackendReused` if the handle's
    /// instance is already attached (or freed) anywhere, leaving both the
    /// instance and this database's list untouched.
    pub fn add_backend(&mut self, handle: &OdbHandle, priority: i32) -> StoreResult<()> {
        let backend = handle.claim()?;
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(priority, seq, capabilities = ?backend.capabilities(), "backend attached");
        self.slots.push(Slot {
            priority,
            seq,
            backend,
        });
        self.slots.sort_by_key(|s| (s.priority, s.seq));
        Ok(())
    }

    /// Check whether any backend holds the object.
    ///
    /// Short-circuits on the first affirmative answer.
    pub fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        fan_exists(&self.slots, id)
    }

    /// Read an object's kind and size.
    pub fn read_header(&self, id: &ObjectId) -> StoreResult<ObjectHeader> {
        fan_read_header(&self.slots, id)
    }

    /// Read an object in full.
    pub fn read(&self, id: &ObjectId) -> StoreResult<Object> {
        fan_read(&self.slots, id)
    }

    /// Store an object through the designated write backend.
    ///
    /// The write goes to exactly one backend: the first in priority order
    /// whose capabilities include `WRITE` (attachment order breaks ties).
    /// It is never broadcast.
    pub fn write(&self, kind: ObjectKind, data: &[u8]) -> StoreResult<ObjectId> {
        route_write(&self.slots, kind, data)
    }

    /// Store an object through the backend attached at `priority`.
    ///
    /// Fails with `NoBackend` if no write-capable backend sits at that
    /// priority.
    pub fn write_to(&self, priority: i32, kind: ObjectKind, data: &[u8]) -> StoreResult<ObjectId> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.priority == priority && s.backend.capabilities().contains(Capabilities::WRITE))
            .ok_or(StoreError::NoBackend)?;
        write_via(slot, kind, data)
    }

    /// Enumerate every object ID in every backend.
    ///
    /// Backends are visited in attachment order and their enumerations
    /// concatenated; an ID present in several backends appears once per
    /// backend (union, not override, semantics). The sequence is lazy and
    /// single-pass; a fresh call re-enumerates.
    pub fn enumerate(&self) -> Enumerate<'_> {
        let mut order: Vec<&Slot> = self.slots.iter().collect();
        order.sort_by_key(|s| s.seq);
        Enumerate {
            slots: order.into_iter(),
            current: Vec::new().into_iter(),
            failed: false,
        }
    }

    /// Resolve an abbreviated ID to the unique object it names.
    ///
    /// Scans the enumeration: no match is `NotFound`, more than one
    /// distinct match is `AmbiguousPrefix`.
    pub fn resolve_prefix(&self, prefix: &OidPrefix) -> StoreResult<ObjectId> {
        let mut found: Option<ObjectId> = None;
        for id in self.enumerate() {
            let id = id?;
            if !prefix.matches(&id) {
                continue;
            }
            match found {
                None => found = Some(id),
                // The same object surfacing from several backends is not
                // ambiguous; two different objects are.
                Some(prev) if prev == id => {}
                Some(_) => return Err(StoreError::AmbiguousPrefix(prefix.to_string())),
            }
        }
        found.ok_or(StoreError::NotFound(*prefix.id()))
    }

    /// Take an owned snapshot of the backend list for off-thread calls.
    ///
    /// The snapshot pins every attached backend for as long as it lives,
    /// and later `add_backend` calls on this database do not affect it: a
    /// call running against the snapshot behaves exactly like a direct
    /// synchronous call made at snapshot time.
    pub fn snapshot(&self) -> OdbSnapshot {
        OdbSnapshot {
            slots: self.slots.clone(),
        }
    }
}

impl Default for ObjectDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ObjectDatabase {
    fn drop(&mut self) {
        debug!(backends = self.slots.len(), "object database torn down");
        for slot in &self.slots {
            slot.backend.release();
        }
    }
}

impl std::fmt::Debug for ObjectDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDatabase")
            .field("backends", &self.slots.len())
            .field("root", &self.root)
            .finish()
    }
}

/// An owned, `Send` view of a database's backend list.
///
/// Produced by [`ObjectDatabase::snapshot`] for calls that run on a worker
/// thread. Read operations behave exactly like the database's own; the
/// backends stay alive until the snapshot is dropped.
#[derive(Clone)]
pub struct OdbSnapshot {
    slots: Vec<Slot>,
}

impl OdbSnapshot {
    /// See [`ObjectDatabase::exists`].
    pub fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        fan_exists(&self.slots, id)
    }

    /// See [`ObjectDatabase::read_header`].
    pub fn read_header(&self, id: &ObjectId) -> StoreResult<ObjectHeader> {
        fan_read_header(&self.slots, id)
    }

    /// See [`ObjectDatabase::read`].
    pub fn read(&self, id: &ObjectId) -> StoreResult<Object> {
        fan_read(&self.slots, id)
    }

    /// See [`ObjectDatabase::write`].
    pub fn write(&self, kind: ObjectKind, data: &[u8]) -> StoreResult<ObjectId> {
        route_write(&self.slots, kind, data)
    }

    /// Number of backends in the snapshot.
    pub fn backend_count(&self) -> usize {
        self.slots.len()
    }
}

/// Lazy union enumeration over attached backends.
///
/// Yields `Err` at most once (a failing backend ends the sequence).
pub struct Enumerate<'a> {
    slots: std::vec::IntoIter<&'a Slot>,
    current: std::vec::IntoIter<ObjectId>,
    failed: bool,
}

impl Iterator for Enumerate<'_> {
    type Item = StoreResult<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(id) = self.current.next() {
                return Some(Ok(id));
            }
            let slot = self.slots.next()?;
            match slot.backend.enumerate() {
                Ok(ids) => self.current = ids.into_iter(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fan-out plumbing shared by the database and its snapshots
// ---------------------------------------------------------------------------

fn fan_exists(slots: &[Slot], id: &ObjectId) -> StoreResult<bool> {
    for slot in slots {
        match slot.backend.exists(id) {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

fn fan_read(slots: &[Slot], id: &ObjectId) -> StoreResult<Object> {
    for slot in slots {
        match slot.backend.read(id) {
            Ok(obj) => return Ok(obj),
            // A miss falls through to the next backend; a hard failure is
            // distinct from "this backend doesn't have it" and propagates.
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    Err(StoreError::NotFound(*id))
}

fn fan_read_header(slots: &[Slot], id: &ObjectId) -> StoreResult<ObjectHeader> {
    for slot in slots {
        match slot.backend.read_header(id) {
            Ok(header) => return Ok(header),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }
    Err(StoreError::NotFound(*id))
}

fn route_write(slots: &[Slot], kind: ObjectKind, data: &[u8]) -> StoreResult<ObjectId> {
    let slot = slots
        .iter()
        .find(|s| s.backend.capabilities().contains(Capabilities::WRITE))
        .ok_or(StoreError::NoBackend)?;
    write_via(slot, kind, data)
}

fn write_via(slot: &Slot, kind: ObjectKind, data: &[u8]) -> StoreResult<ObjectId> {
    let id = slot.backend.write(kind, data)?;
    // The contract requires a valid id back from the backend; accepting a
    // zero id silently would poison every later lookup.
    if id.is_zero() {
        return Err(StoreError::ProtocolViolation(
            "write returned the zero id".into(),
        ));
    }
    debug!(seq = slot.seq, id = %id.short_hex(), kind = %kind, "object written");
    Ok(id)
}
