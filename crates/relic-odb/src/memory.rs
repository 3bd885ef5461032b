use std::collections::HashMap;
use std::sync::RwLock;

use relic_types::{Attachable, ObjectId, StoreError, StoreResult};

use crate::backend::{Backend, Capabilities};
use crate::object::{Object, ObjectHeader, ObjectKind};

/// In-memory, HashMap-based backend.
///
/// Implements the full capability set. Intended for tests and embedding.
/// All objects are held in memory behind a `RwLock`; objects are cloned on
/// read.
pub struct MemoryBackend {
    objects: RwLock<HashMap<ObjectId, Object>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the backend holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|obj| obj.size)
            .sum()
    }

    /// Remove all objects.
    pub fn clear(&self) {
        self.objects.write().expect("lock poisoned").clear();
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Attachable for MemoryBackend {
    fn free(&self) {
        self.clear();
    }
}

impl Backend for MemoryBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    fn read_header(&self, id: &ObjectId) -> StoreResult<ObjectHeader> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id)
            .map(Object::header)
            .ok_or(StoreError::NotFound(*id))
    }

    fn read(&self, id: &ObjectId) -> StoreResult<Object> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    fn write(&self, kind: ObjectKind, data: &[u8]) -> StoreResult<ObjectId> {
        let object = Object::new(kind, data.to_vec());
        let id = object.compute_id();
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: content-addressing guarantees the same ID always maps
        // to the same content.
        map.entry(id).or_insert(object);
        Ok(id)
    }

    fn enumerate(&self) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::hash_object;

    // -----------------------------------------------------------------------
    // Core read/write
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_back() {
        let backend = MemoryBackend::new();
        let id = backend.write(ObjectKind::Blob, b"hello world").unwrap();
        assert!(!id.is_zero());

        let obj = backend.read(&id).unwrap();
        assert_eq!(obj.kind, ObjectKind::Blob);
        assert_eq!(obj.data, b"hello world");
        assert_eq!(obj.size, 11);
    }

    #[test]
    fn write_returns_the_content_hash() {
        let backend = MemoryBackend::new();
        let id = backend.write(ObjectKind::Tree, b"entries").unwrap();
        assert_eq!(id, hash_object(ObjectKind::Tree, b"entries"));
    }

    #[test]
    fn read_header_without_data() {
        let backend = MemoryBackend::new();
        let id = backend.write(ObjectKind::Commit, b"commit payload").unwrap();
        let header = backend.read_header(&id).unwrap();
        assert_eq!(header.kind, ObjectKind::Commit);
        assert_eq!(header.size, 14);
    }

    #[test]
    fn read_missing_is_not_found() {
        let backend = MemoryBackend::new();
        let id = hash_object(ObjectKind::Blob, b"never written");
        assert!(matches!(backend.read(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(
            backend.read_header(&id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn exists_tracks_contents() {
        let backend = MemoryBackend::new();
        let id = hash_object(ObjectKind::Blob, b"present");
        assert!(!backend.exists(&id).unwrap());
        backend.write(ObjectKind::Blob, b"present").unwrap();
        assert!(backend.exists(&id).unwrap());
    }

    #[test]
    fn write_is_idempotent() {
        let backend = MemoryBackend::new();
        let id1 = backend.write(ObjectKind::Blob, b"same").unwrap();
        let id2 = backend.write(ObjectKind::Blob, b"same").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn same_bytes_different_kind_stored_separately() {
        let backend = MemoryBackend::new();
        let blob = backend.write(ObjectKind::Blob, b"payload").unwrap();
        let tree = backend.write(ObjectKind::Tree, b"payload").unwrap();
        assert_ne!(blob, tree);
        assert_eq!(backend.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    #[test]
    fn enumerate_is_sorted() {
        let backend = MemoryBackend::new();
        backend.write(ObjectKind::Blob, b"aaa").unwrap();
        backend.write(ObjectKind::Blob, b"bbb").unwrap();
        backend.write(ObjectKind::Blob, b"ccc").unwrap();

        let ids = backend.enumerate().unwrap();
        assert_eq!(ids.len(), 3);
        for w in ids.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn enumerate_empty_backend() {
        let backend = MemoryBackend::new();
        assert!(backend.enumerate().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Capabilities / bookkeeping
    // -----------------------------------------------------------------------

    #[test]
    fn full_capability_set() {
        let backend = MemoryBackend::new();
        assert!(backend.capabilities().contains(Capabilities::all()));
    }

    #[test]
    fn total_bytes_sums_sizes() {
        let backend = MemoryBackend::new();
        backend.write(ObjectKind::Blob, b"12345").unwrap();
        backend.write(ObjectKind::Blob, b"123456789").unwrap();
        assert_eq!(backend.total_bytes(), 14);
    }

    #[test]
    fn free_clears_contents() {
        let backend = MemoryBackend::new();
        backend.write(ObjectKind::Blob, b"x").unwrap();
        Attachable::free(&backend);
        assert!(backend.is_empty());
    }

    #[test]
    fn debug_format() {
        let backend = MemoryBackend::new();
        backend.write(ObjectKind::Blob, b"x").unwrap();
        let debug = format!("{backend:?}");
        assert!(debug.contains("MemoryBackend"));
        assert!(debug.contains("object_count"));
    }

    // -----------------------------------------------------------------------
    // Concurrent read safety
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let backend = Arc::new(MemoryBackend::new());
        let id = backend.write(ObjectKind::Blob, b"shared data").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    let obj = backend.read(&id).unwrap();
                    assert_eq!(obj.compute_id(), id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }
}
