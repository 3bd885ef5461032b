//! Foundation types for relic.
//!
//! This crate provides the pieces every relic crate builds on: the
//! content-addressed [`ObjectId`], the closed error taxonomy
//! ([`ErrorKind`] / [`StoreError`]), and the backend ownership handle
//! ([`BackendHandle`]) that enforces the attach-exactly-once rule shared by
//! both aggregators.
//!
//! # Key Types
//!
//! - [`ObjectId`] — fixed 20-byte content hash with hex codec and ordering
//! - [`OidPrefix`] — abbreviated ID form, valid for lookups only
//! - [`StoreError`] / [`ErrorKind`] — the closed failure taxonomy
//! - [`BackendHandle`] / [`Attached`] — ownership transfer for backends
//! - [`Lifecycle`] — the {unattached, attached, freed} state machine

pub mod error;
pub mod handle;
pub mod oid;

pub use error::{ErrorKind, ForeignError, StoreError, StoreResult};
pub use handle::{Attachable, Attached, BackendHandle, Lifecycle};
pub use oid::{ObjectId, OidPrefix, OID_HEX_LEN, OID_RAW_LEN};
