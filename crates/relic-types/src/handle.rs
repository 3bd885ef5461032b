//! Backend ownership handles.
//!
//! A backend instance is exclusively owned by at most one aggregator at a
//! time. [`BackendHandle`] wraps the instance in a shared cell carrying a
//! [`Lifecycle`] flag; attaching an aggregator claims the cell, and a second
//! claim of the same cell fails with `BackendReused`. Once claimed, the
//! caller's handle is inert: only the owning aggregator can release the
//! backend, and release runs the backend's `free()` exactly once.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{StoreError, StoreResult};

/// Where a backend instance is in its ownership life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, not yet owned by any aggregator.
    Unattached,
    /// Owned by exactly one aggregator.
    Attached,
    /// Resources released; the instance is dead.
    Freed,
}

/// Resource-release hook shared by every backend contract.
///
/// `free` is invoked exactly once per instance, by the owning handle at
/// aggregator teardown. Implementations must not assume idempotence is
/// needed; the handle guarantees the single call.
pub trait Attachable: Send + Sync {
    /// Release backend-held resources.
    fn free(&self) {}
}

struct Cell<B: ?Sized> {
    state: Mutex<Lifecycle>,
    backend: Box<B>,
}

/// A shareable handle to a backend instance awaiting attachment.
///
/// Cloning the handle shares the same underlying instance; the ownership
/// rule is per-instance, not per-handle. Handles are usually trait-object
/// typed (`BackendHandle<dyn Backend>`), built by boxing the concrete
/// backend at the construction site.
pub struct BackendHandle<B: Attachable + ?Sized> {
    cell: Arc<Cell<B>>,
}

impl<B: Attachable + ?Sized> Clone for BackendHandle<B> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<B: Attachable + ?Sized> fmt::Debug for BackendHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

impl<B: Attachable + ?Sized> BackendHandle<B> {
    /// Wrap a freshly constructed backend in an unattached handle.
    pub fn new(backend: Box<B>) -> Self {
        Self {
            cell: Arc::new(Cell {
                state: Mutex::new(Lifecycle::Unattached),
                backend,
            }),
        }
    }

    /// Current lifecycle state of the underlying instance.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.cell.state.lock().expect("lifecycle lock poisoned")
    }

    /// Claim exclusive ownership for an aggregator.
    ///
    /// Succeeds only from `Unattached` and transitions to `Attached`; any
    /// other state fails with [`StoreError::BackendReused`] and leaves the
    /// state untouched.
    pub fn claim(&self) -> StoreResult<Attached<B>> {
        let mut state = self.cell.state.lock().expect("lifecycle lock poisoned");
        if *state != Lifecycle::Unattached {
            return Err(StoreError::BackendReused);
        }
        *state = Lifecycle::Attached;
        Ok(Attached {
            cell: Arc::clone(&self.cell),
        })
    }
}

/// Exclusive ownership of a claimed backend, held by an aggregator.
///
/// Dereferences to the backend for dispatch. [`Attached::release`] runs the
/// backend's `free()` exactly once; the lifecycle flag makes a second
/// release a no-op.
pub struct Attached<B: Attachable + ?Sized> {
    cell: Arc<Cell<B>>,
}

impl<B: Attachable + ?Sized> Clone for Attached<B> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<B: Attachable + ?Sized> Attached<B> {
    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.cell.state.lock().expect("lifecycle lock poisoned")
    }

    /// Run the backend's `free()` and mark the instance dead.
    ///
    /// Only the first release frees; later calls observe `Freed` and return
    /// without touching the backend.
    pub fn release(&self) {
        let mut state = self.cell.state.lock().expect("lifecycle lock poisoned");
        if *state == Lifecycle::Attached {
            self.cell.backend.free();
            *state = Lifecycle::Freed;
        }
    }
}

impl<B: Attachable + ?Sized> std::ops::Deref for Attached<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.cell.backend
    }
}

impl<B: Attachable + ?Sized> fmt::Debug for Attached<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attached")
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        frees: Arc<AtomicUsize>,
    }

    impl Attachable for CountingBackend {
        fn free(&self) {
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting() -> (BackendHandle<CountingBackend>, Arc<AtomicUsize>) {
        let frees = Arc::new(AtomicUsize::new(0));
        let handle = BackendHandle::new(Box::new(CountingBackend {
            frees: Arc::clone(&frees),
        }));
        (handle, frees)
    }

    #[test]
    fn fresh_handle_is_unattached() {
        let (handle, _) = counting();
        assert_eq!(handle.lifecycle(), Lifecycle::Unattached);
    }

    #[test]
    fn claim_transitions_to_attached() {
        let (handle, _) = counting();
        let attached = handle.claim().unwrap();
        assert_eq!(handle.lifecycle(), Lifecycle::Attached);
        assert_eq!(attached.lifecycle(), Lifecycle::Attached);
    }

    #[test]
    fn second_claim_fails_with_backend_reused() {
        let (handle, _) = counting();
        let _attached = handle.claim().unwrap();
        assert!(matches!(handle.claim(), Err(StoreError::BackendReused)));
        // State is untouched by the failed claim.
        assert_eq!(handle.lifecycle(), Lifecycle::Attached);
    }

    #[test]
    fn clone_shares_the_same_instance() {
        let (handle, _) = counting();
        let twin = handle.clone();
        let _attached = handle.claim().unwrap();
        assert!(matches!(twin.claim(), Err(StoreError::BackendReused)));
    }

    #[test]
    fn trait_object_handles_share_the_same_rule() {
        let handle: BackendHandle<dyn Attachable> =
            BackendHandle::new(Box::new(CountingBackend {
                frees: Arc::new(AtomicUsize::new(0)),
            }));
        let twin = handle.clone();
        let _attached = handle.claim().unwrap();
        assert!(matches!(twin.claim(), Err(StoreError::BackendReused)));
    }

    #[test]
    fn release_frees_exactly_once() {
        let (handle, frees) = counting();
        let attached = handle.claim().unwrap();
        attached.release();
        attached.release();
        attached.release();
        assert_eq!(frees.load(Ordering::SeqCst), 1);
        assert_eq!(handle.lifecycle(), Lifecycle::Freed);
    }

    #[test]
    fn freed_handle_cannot_be_reclaimed() {
        let (handle, _) = counting();
        let attached = handle.claim().unwrap();
        attached.release();
        assert!(matches!(handle.claim(), Err(StoreError::BackendReused)));
    }
}
