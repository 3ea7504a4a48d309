//! Scan progress counters, written by the loader thread and polled by the UI.

use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub done: bool,
}

#[derive(Debug, Default)]
pub struct LoadProgress {
    inner: Mutex<ProgressSnapshot>,
}

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        *self.lock() = ProgressSnapshot::default();
    }

    pub fn set_total(&self, total: usize) {
        self.lock().total = total;
    }

    pub fn increment(&self) {
        self.lock().processed += 1;
    }

    /// No increments follow once this is set.
    pub fn mark_done(&self) {
        self.lock().done = true;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, ProgressSnapshot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
