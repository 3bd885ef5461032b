//! Operational tunables for an object database.
//!
//! These are performance knobs, not correctness knobs. They are read once
//! at aggregator construction and handed to backends that care (a
//! packfile backend would size its mmap windows from them); nothing in the
//! composition layer interprets them further. There is no process-global
//! state: each database carries its own copy.

/// Tunables consumed at [`crate::ObjectDatabase`] construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OdbConfig {
    /// Ceiling for backend-side object caches, in bytes.
    pub cache_bytes: usize,
    /// Size of a single memory-mapped window, in bytes.
    pub mmap_window_bytes: usize,
    /// Maximum number of simultaneously mapped windows.
    pub mmap_window_count: usize,
}

impl Default for OdbConfig {
    fn default() -> Self {
        Self {
            cache_bytes: 256 << 20,
            mmap_window_bytes: 64 << 20,
            mmap_window_count: 32,
        }
    }
}
