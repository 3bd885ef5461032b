//! The backend contract every unit of object storage satisfies.
//!
//! A backend may implement any subset of the operations; its
//! [`Capabilities`] advertise which. Omitted operations answer through the
//! trait defaults: lookups miss, writes are rejected, enumeration is empty.
//! The aggregator consults capabilities only where it must pick a backend
//! (write routing); for lookups the defaults already behave like a miss.

use std::fmt;

use relic_types::{Attachable, BackendHandle, ObjectId, StoreError, StoreResult};

use crate::object::{Object, ObjectHeader, ObjectKind};

/// Bitset describing which operations a backend implements.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// Can answer `exists`.
    pub const EXISTS: Self = Self(1 << 0);
    /// Can answer `read`.
    pub const READ: Self = Self(1 << 1);
    /// Can answer `read_header`.
    pub const READ_HEADER: Self = Self(1 << 2);
    /// Can perform `write`.
    pub const WRITE: Self = Self(1 << 3);
    /// Can enumerate its object IDs.
    pub const ENUMERATE: Self = Self(1 << 4);

    /// No capabilities at all.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every capability.
    pub const fn all() -> Self {
        Self(0b11111)
    }

    /// Returns `true` if every capability in `other` is present.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no capability is present.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (cap, name) in [
            (Self::EXISTS, "exists"),
            (Self::READ, "read"),
            (Self::READ_HEADER, "read_header"),
            (Self::WRITE, "write"),
            (Self::ENUMERATE, "enumerate"),
        ] {
            if self.contains(cap) {
                set.entry(&name);
            }
        }
        set.finish()
    }
}

/// A unit of object storage.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; the same data always produces the
///   same ID.
/// - A miss is `NotFound` (or `Ok(false)` for `exists`), never a hard
///   error; hard errors mean the backend itself failed.
/// - `write` returns a valid non-zero ID for the stored content.
/// - Implementations are `Send + Sync`; concurrent reads are safe.
///
/// Every operation is optional. The defaults make an unimplemented
/// operation behave as "this backend cannot confirm": lookups miss, writes
/// are rejected, enumeration yields nothing.
pub trait Backend: Attachable {
    /// Which operations this backend actually implements.
    fn capabilities(&self) -> Capabilities;

    /// Check whether an object exists in this backend.
    fn exists(&self, _id: &ObjectId) -> StoreResult<bool> {
        Ok(false)
    }

    /// Read an object's kind and size without its data.
    fn read_header(&self, id: &ObjectId) -> StoreResult<ObjectHeader> {
        Err(StoreError::NotFound(*id))
    }

    /// Read an object in full.
    fn read(&self, id: &ObjectId) -> StoreResult<Object> {
        Err(StoreError::NotFound(*id))
    }

    /// Store an object, returning its content-addressed ID.
    fn write(&self, _kind: ObjectKind, _data: &[u8]) -> StoreResult<ObjectId> {
        Err(StoreError::WriteRejected)
    }

    /// All object IDs held by this backend, in the backend's own order.
    fn enumerate(&self) -> StoreResult<Vec<ObjectId>> {
        Ok(Vec::new())
    }
}

/// Handle type for object-database backends.
pub type OdbHandle = BackendHandle<dyn Backend>;
