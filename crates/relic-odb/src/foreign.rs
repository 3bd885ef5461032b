//! Bridge for backends implemented outside the native engine.
//!
//! A foreign backend is supplied as a set of closures speaking a loose
//! record protocol: object IDs cross the boundary as hex strings, results
//! come back as [`ForeignRecord`]s whose fields are all optional, and "no
//! value" is an explicit sentinel (`None`) distinct from an incomplete
//! answer. [`ForeignBackend`] adapts that protocol onto the native
//! [`Backend`] contract so the aggregator never knows the difference.
//!
//! The capability set is probed once at build time from which closures are
//! present, never per call. A foreign object implementing only `read`
//! behaves as a read-only, partial backend: `exists` answers `false`,
//! `write` is rejected.
//!
//! Errors raised inside foreign code propagate with their identity
//! preserved ([`StoreError::Foreign`]); an answer in the wrong *shape* is a
//! [`StoreError::ProtocolViolation`] instead.

use serde::Deserialize;

use relic_types::{Attachable, ForeignError, ObjectId, StoreError, StoreResult};

use crate::backend::{Backend, Capabilities};
use crate::object::{Object, ObjectHeader, ObjectKind};

/// A lookup answer from a foreign backend.
///
/// Every field is optional because the foreign side is untyped; the
/// adapter enforces per-operation requirements (`read` needs `kind` +
/// `data`, `read_header` needs `kind` + `len`) and reports what is missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ForeignRecord {
    /// Object kind tag ("blob", "tree", "commit", "tag").
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Object size in bytes.
    #[serde(rename = "length")]
    pub len: Option<u64>,
    /// Object content.
    pub data: Option<Vec<u8>>,
}

impl ForeignRecord {
    /// A full-read answer: kind and data.
    pub fn full(kind: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind: Some(kind.into()),
            len: None,
            data: Some(data),
        }
    }

    /// A header-only answer: kind and length.
    pub fn header(kind: impl Into<String>, len: u64) -> Self {
        Self {
            kind: Some(kind.into()),
            len: Some(len),
            data: None,
        }
    }

    /// Decode a record from a JSON value of the shape
    /// `{"type": "blob", "length": 5, "data": [104, ...]}`.
    ///
    /// For foreign sides that speak JSON (a remote HTTP store, an embedded
    /// scripting environment). Unknown fields are ignored; a shape that
    /// does not decode is a [`StoreError::ProtocolViolation`].
    pub fn from_json(value: serde_json::Value) -> StoreResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::ProtocolViolation(format!("undecodable foreign record: {e}")))
    }
}

/// The argument handed to a foreign `write` closure.
#[derive(Clone, Copy, Debug)]
pub struct ForeignWrite<'a> {
    /// Object content to store.
    pub data: &'a [u8],
    /// Object kind tag.
    pub kind: &'a str,
}

type LookupFn = dyn Fn(&str) -> Result<Option<ForeignRecord>, ForeignError> + Send + Sync;
type WriteFn = dyn Fn(ForeignWrite<'_>) -> Result<Option<String>, ForeignError> + Send + Sync;
type ExistsFn = dyn Fn(&str) -> Result<bool, ForeignError> + Send + Sync;

/// A [`Backend`] whose operations live in caller-supplied closures.
pub struct ForeignBackend {
    read: Option<Box<LookupFn>>,
    read_header: Option<Box<LookupFn>>,
    write: Option<Box<WriteFn>>,
    exists: Option<Box<ExistsFn>>,
    caps: Capabilities,
}

impl ForeignBackend {
    /// Start building a foreign backend from zero operations.
    pub fn builder() -> ForeignBackendBuilder {
        ForeignBackendBuilder::default()
    }

    fn parse_kind(tag: &str) -> StoreResult<ObjectKind> {
        ObjectKind::parse(tag).ok_or_else(|| {
            StoreError::ProtocolViolation(format!("unknown object kind {tag:?}"))
        })
    }
}

/// Builder assembling the closure set of a [`ForeignBackend`].
///
/// `build` probes which operations were supplied and fixes the capability
/// set; it is never re-probed afterwards.
#[derive(Default)]
pub struct ForeignBackendBuilder {
    read: Option<Box<LookupFn>>,
    read_header: Option<Box<LookupFn>>,
    write: Option<Box<WriteFn>>,
    exists: Option<Box<ExistsFn>>,
}

impl ForeignBackendBuilder {
    /// Supply the `read` operation.
    pub fn read<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Option<ForeignRecord>, ForeignError> + Send + Sync + 'static,
    {
        self.read = Some(Box::new(f));
        self
    }

    /// Supply the `read_header` operation.
    pub fn read_header<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<Option<ForeignRecord>, ForeignError> + Send + Sync + 'static,
    {
        self.read_header = Some(Box::new(f));
        self
    }

    /// Supply the `write` operation.
    pub fn write<F>(mut self, f: F) -> Self
    where
        F: Fn(ForeignWrite<'_>) -> Result<Option<String>, ForeignError> + Send + Sync + 'static,
    {
        self.write = Some(Box::new(f));
        self
    }

    /// Supply the `exists` operation.
    pub fn exists<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<bool, ForeignError> + Send + Sync + 'static,
    {
        self.exists = Some(Box::new(f));
        self
    }

    /// Probe the supplied operations and fix the capability set.
    pub fn build(self) -> ForeignBackend {
        let mut caps = Capabilities::empty();
        if self.read.is_some() {
            caps |= Capabilities::READ;
        }
        if self.read_header.is_some() {
            caps |= Capabilities::READ_HEADER;
        }
        if self.write.is_some() {
            caps |= Capabilities::WRITE;
        }
        if self.exists.is_some() {
            caps |= Capabilities::EXISTS;
        }
        tracing::debug!(capabilities = ?caps, "foreign backend built");
        ForeignBackend {
            read: self.read,
            read_header: self.read_header,
            write: self.write,
            exists: self.exists,
            caps,
        }
    }
}

impl Attachable for ForeignBackend {
    // The closure environments own their own resources; nothing to free
    // on the adapter side.
    fn free(&self) {}
}

impl Backend for ForeignBackend {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        match &self.exists {
            None => Ok(false),
            Some(f) => f(&id.to_hex()).map_err(StoreError::Foreign),
        }
    }

    fn read_header(&self, id: &ObjectId) -> StoreResult<ObjectHeader> {
        let f = match &self.read_header {
            None => return Err(StoreError::NotFound(*id)),
            Some(f) => f,
        };
        let record = f(&id.to_hex())
            .map_err(StoreError::Foreign)?
            .ok_or(StoreError::NotFound(*id))?;
        let kind = record
            .kind
            .as_deref()
            .ok_or_else(|| missing_field("read_header", "type"))?;
        let kind = Self::parse_kind(kind)?;
        let size = record
            .len
            .ok_or_else(|| missing_field("read_header", "length"))?;
        Ok(ObjectHeader { kind, size })
    }

    fn read(&self, id: &ObjectId) -> StoreResult<Object> {
        let f = match &self.read {
            None => return Err(StoreError::NotFound(*id)),
            Some(f) => f,
        };
        let record = f(&id.to_hex())
            .map_err(StoreError::Foreign)?
            .ok_or(StoreError::NotFound(*id))?;
        let kind = record
            .kind
            .as_deref()
            .ok_or_else(|| missing_field("read", "type"))?;
        let kind = Self::parse_kind(kind)?;
        let data = record.data.ok_or_else(|| missing_field("read", "data"))?;
        if let Some(len) = record.len {
            if len != data.len() as u64 {
                return Err(StoreError::ProtocolViolation(format!(
                    "read result length {len} disagrees with {} data bytes",
                    data.len()
                )));
            }
        }
        Ok(Object::new(kind, data))
    }

    fn write(&self, kind: ObjectKind, data: &[u8]) -> StoreResult<ObjectId> {
        let f = match &self.write {
            None => return Err(StoreError::WriteRejected),
            Some(f) => f,
        };
        let request = ForeignWrite {
            data,
            kind: kind.as_str(),
        };
        let hex = f(request)
            .map_err(StoreError::Foreign)?
            // The foreign "no value" sentinel on write means the write was
            // refused, not that it succeeded silently.
            .ok_or(StoreError::WriteRejected)?;
        ObjectId::from_hex(&hex).map_err(|_| {
            StoreError::ProtocolViolation(format!("write returned malformed id {hex:?}"))
        })
    }
}

fn missing_field(op: &str, field: &str) -> StoreError {
    tracing::warn!(op, field, "foreign backend answered incompletely");
    StoreError::ProtocolViolation(format!("{op} result missing {field:?}"))
}

impl std::fmt::Debug for ForeignBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignBackend")
            .field("capabilities", &self.caps)
            .finish()
    }
}
