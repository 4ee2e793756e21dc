//! Uniform random assignee selection.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniformly distributed indices, shared across requests
pub trait RandomSource: Send + Sync {
    /// An index in `0..len`; `len` is never zero
    fn index(&self, len: usize) -> usize;
}

/// Thread-local OS-seeded generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic generator for tests and reproducible runs
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..len)
    }
}

/// Picks the assignee of each new ticket from a fixed roster.
#[derive(Clone)]
pub struct AssigneeSelector {
    roster: Arc<[String]>,
    source: Arc<dyn RandomSource>,
}

impl AssigneeSelector {
    pub fn new(roster: Vec<String>, source: Arc<dyn RandomSource>) -> Self {
        Self {
            roster: roster.into(),
            source,
        }
    }

    /// Roster picked from with the thread-local generator
    pub fn with_thread_rng(roster: Vec<String>) -> Self {
        Self::new(roster, Arc::new(ThreadRandom))
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// A roster entry, or an empty string (unassigned) for an empty roster
    pub fn select(&self) -> String {
        if self.roster.is_empty() {
            return String::new();
        }

        let index = self.source.index(self.roster.len()).min(self.roster.len() - 1);
        self.roster[index].clone()
    }
}

impl std::fmt::Debug for AssigneeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssigneeSelector").field("roster", &self.roster).finish()
    }
}
