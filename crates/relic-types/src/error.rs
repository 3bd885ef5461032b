//! The closed error taxonomy shared by both aggregators.
//!
//! Every fallible store operation surfaces a [`StoreError`]. Each carrier
//! variant classifies into exactly one [`ErrorKind`]; the kind set is closed
//! and callers can match on it exhaustively. Failures reported by the
//! underlying storage engine arrive as raw status codes and are classified
//! through a fixed lookup table; unmapped codes fall back to
//! [`ErrorKind::InvalidOperation`] rather than being dropped.

use crate::oid::ObjectId;

/// Classification of store failures. Closed set; every [`StoreError`]
/// projects onto exactly one kind via [`StoreError::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad hex or wrong length for an object ID.
    MalformedId,
    /// No backend holds the requested object or reference.
    NotFound,
    /// A backend handle was attached more than once.
    BackendReused,
    /// Operation on an aggregator with no attached backend.
    NoBackend,
    /// A foreign backend answered in a shape that violates the contract.
    ProtocolViolation,
    /// A write was refused or returned no value.
    WriteRejected,
    /// Underlying storage medium failure (memory, OS, filesystem).
    Io,
    /// Fallback for unmapped engine codes and caller-originated failures.
    InvalidOperation,
}

/// Fixed mapping from engine status codes to error kinds.
///
/// The storage engine reports failures as negative integers; this table is
/// the only place those codes are interpreted.
const ENGINE_CODES: &[(i32, ErrorKind)] = &[
    (-3, ErrorKind::NotFound),
    (-5, ErrorKind::MalformedId),
    (-8, ErrorKind::WriteRejected),
    (-12, ErrorKind::Io),
    (-14, ErrorKind::ProtocolViolation),
];

impl ErrorKind {
    /// Classify a raw engine status code.
    ///
    /// Unknown codes classify as [`ErrorKind::InvalidOperation`].
    pub fn from_engine_code(code: i32) -> Self {
        ENGINE_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::InvalidOperation)
    }
}

/// A failure raised by a foreign backend's own code, preserved intact.
pub type ForeignError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by store operations.
///
/// Variants carry context; [`StoreError::kind`] projects onto the closed
/// [`ErrorKind`] taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The given string is not a well-formed object ID.
    #[error("malformed object id: {0:?}")]
    MalformedId(String),

    /// The requested object was not found in any backend.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The requested reference was not found.
    #[error("ref not found: {0:?}")]
    RefNotFound(String),

    /// An abbreviated ID matched more than one object.
    #[error("ambiguous id prefix: {0:?}")]
    AmbiguousPrefix(String),

    /// The backend handle has already been attached (or freed).
    #[error("backend is already attached")]
    BackendReused,

    /// Operation on an aggregator with no attached backend.
    #[error("no backend attached")]
    NoBackend,

    /// A foreign backend answered, but in a shape that does not satisfy
    /// the contract.
    #[error("foreign backend protocol violation: {0}")]
    ProtocolViolation(String),

    /// A write was refused or returned no value.
    #[error("write rejected by backend")]
    WriteRejected,

    /// The reference name is not valid.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// I/O error from the underlying storage medium.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A failure raised inside foreign backend code, passed through with
    /// its original identity preserved (reachable via `source()`).
    #[error("foreign backend failure: {0}")]
    Foreign(#[source] ForeignError),

    /// Fallback for everything the fixed taxonomy does not name.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// Project this error onto the closed [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedId(_) => ErrorKind::MalformedId,
            Self::NotFound(_) | Self::RefNotFound(_) => ErrorKind::NotFound,
            Self::BackendReused => ErrorKind::BackendReused,
            Self::NoBackend => ErrorKind::NoBackend,
            Self::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            Self::WriteRejected => ErrorKind::WriteRejected,
            Self::Io(_) => ErrorKind::Io,
            Self::AmbiguousPrefix(_)
            | Self::InvalidRefName { .. }
            | Self::Foreign(_)
            | Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
        }
    }

    /// Returns `true` if this is a miss (object or ref not found).
    ///
    /// Misses are recovered locally during fan-out; every other kind
    /// short-circuits.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Build an error from a raw engine status code and message.
    pub fn from_engine_code(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        match ErrorKind::from_engine_code(code) {
            ErrorKind::NotFound => Self::RefNotFound(message),
            ErrorKind::MalformedId => Self::MalformedId(message),
            ErrorKind::WriteRejected => Self::WriteRejected,
            ErrorKind::Io => Self::Io(std::io::Error::other(message)),
            ErrorKind::ProtocolViolation => Self::ProtocolViolation(message),
            _ => Self::InvalidOperation(format!("engine code {code}: {message}")),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
