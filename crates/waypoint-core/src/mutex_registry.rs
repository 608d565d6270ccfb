//! Process-wide per-path file mutex registry.
//!
//! Serializes writers against each other for a given file path. Readers do
//! not participate (see the storage engine's torn-record truncation
//! instead).
//!
//! # Design note
//!
//! The registry always removes a path's entry once its critical section
//! finishes, regardless of whether another task is still waiting on the same
//! `Arc<Mutex<()>>`. A waiter that already cloned the Arc before the entry
//! was removed still completes correctly — it holds its own strong
//! reference — but a *new* caller for the same path after the removal gets a
//! fresh, independent mutex. Two concurrent critical sections for the same
//! path can therefore briefly run in parallel if one call finishes and
//! removes the entry while another call is still queued on the old mutex.
//! This mirrors a known tradeoff in the system this registry is modeled on:
//! it is simple and leak-free at the cost of that narrow race. See
//! `DESIGN.md` for the accepted rationale.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// Registry of per-path mutexes, created on demand.
#[derive(Default)]
pub struct FileMutexRegistry {
    mutexes: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl FileMutexRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `critical_section` while holding the mutex for `path`.
    ///
    /// Creates the per-path mutex on first use and removes it again once
    /// `critical_section` returns, per the design note above.
    pub fn with_lock<T>(&self, path: &Path, critical_section: impl FnOnce() -> T) -> T {
        let entry = {
            let mut mutexes = self.mutexes.lock().unwrap_or_else(|poison| poison.into_inner());
            mutexes.entry(path.to_path_buf()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };

        let result = {
            let _guard = entry.lock().unwrap_or_else(|poison| poison.into_inner());
            critical_section()
        };

        let mut mutexes = self.mutexes.lock().unwrap_or_else(|poison| poison.into_inner());
        mutexes.remove(path);

        result
    }
}
