//! Duration probe scheduling: a fixed number of in-flight slots fed FIFO
//! from the pending queue.
//!
//! The queue only decides *what* to dispatch. Every completion frees one
//! slot and pulls at most one more path, so at most `slots` probes are ever
//! running. Execution lives in the runtime; results come back as events.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Pool size: never more than the worker cap, never more than the queue.
pub fn pool_size(worker_cap: usize, queued: usize) -> usize {
    worker_cap.max(1).min(queued)
}

#[derive(Debug, Clone, Default)]
pub struct DurationQueue {
    pending: VecDeque<PathBuf>,
    in_flight: HashSet<PathBuf>,
    slots: usize,
    total: usize,
    done: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Result for a path that was not in flight; ignored.
    Unknown,
    /// Recorded; more work remains.
    Progress,
    /// Recorded and nothing is pending or in flight.
    Finished,
}

impl DurationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue paths and fill free slots. Paths already queued or in flight
    /// are skipped, so each path has at most one probe at a time.
    /// Returns the paths to dispatch now.
    pub fn enqueue(&mut self, paths: Vec<PathBuf>, worker_cap: usize) -> Vec<PathBuf> {
        let mut added = 0;
        for p in paths {
            if self.in_flight.contains(&p) || self.pending.contains(&p) {
                continue;
            }
            self.pending.push_back(p);
            added += 1;
        }
        self.total += added;

        let target = pool_size(worker_cap, self.pending.len() + self.in_flight.len());
        self.slots = self.slots.max(target);
        let mut dispatch = Vec::new();
        while self.in_flight.len() < self.slots {
            match self.dequeue() {
                Some(p) => dispatch.push(p),
                None => break,
            }
        }
        dispatch
    }

    /// Record a finished probe. On `Progress` the caller dispatches
    /// whatever `next()` returns.
    pub fn complete(&mut self, path: &Path) -> Completion {
        if !self.in_flight.remove(path) {
            return Completion::Unknown;
        }
        self.done += 1;
        if self.is_finished() {
            self.reset();
            return Completion::Finished;
        }
        Completion::Progress
    }

    /// Next path for a freed slot.
    pub fn next(&mut self) -> Option<PathBuf> {
        if self.in_flight.len() >= self.slots {
            return None;
        }
        self.dequeue()
    }

    fn dequeue(&mut self) -> Option<PathBuf> {
        let p = self.pending.pop_front()?;
        self.in_flight.insert(p.clone());
        Some(p)
    }

    /// Both conditions matter: the counter can read complete while the
    /// last dispatch is still running.
    fn is_finished(&self) -> bool {
        self.done >= self.total && self.in_flight.is_empty() && self.pending.is_empty()
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.total > 0
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued(&self) -> usize {
        self.pending.len()
    }
}
