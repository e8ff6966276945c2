//! Idle cooldown tracking.
//!
//! Records, per function, the instant its backlog was first seen at zero.
//! An entry exists only while the most recent observation was zero, so
//! presence always means "idle since T".
//!
//! The map is shared between overlapping cycles. Every operation takes the
//! lock for a single key operation and releases it before returning; no
//! lock is held across collaborator calls.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

/// What an observation did to the cooldown table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownTransition {
    /// First zero observation: an entry was created.
    Started,
    /// First non-zero observation after idling: the entry was removed.
    Cleared,
    /// Nothing changed.
    Unchanged,
}

/// A point-in-time view of one idle function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooldownEntry {
    pub function: String,
    pub idle_secs: u64,
}

/// Per-function idle-since timestamps.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    entries: Mutex<HashMap<String, Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one backlog observation for `function`.
    ///
    /// Zero with no entry inserts `now`; non-zero with an entry removes it.
    /// Re-observing zero keeps the original timestamp (first writer wins).
    pub fn observe(
        &self,
        function: &str,
        undone_task_count: u64,
        now: Instant,
    ) -> CooldownTransition {
        let mut entries = self.lock();
        if undone_task_count == 0 {
            if entries.contains_key(function) {
                return CooldownTransition::Unchanged;
            }
            entries.insert(function.to_string(), now);
            CooldownTransition::Started
        } else if entries.remove(function).is_some() {
            CooldownTransition::Cleared
        } else {
            CooldownTransition::Unchanged
        }
    }

    /// True iff `function` is idle and has been for strictly longer than
    /// `threshold` at `now`.
    pub fn is_idle_long_enough(&self, function: &str, now: Instant, threshold: Duration) -> bool {
        self.idle_since(function)
            .is_some_and(|since| now.saturating_duration_since(since) > threshold)
    }

    /// When `function` was first seen idle, if it is currently idle.
    pub fn idle_since(&self, function: &str) -> Option<Instant> {
        self.lock().get(function).copied()
    }

    /// Current entries sorted by function name.
    pub fn snapshot(&self, now: Instant) -> Vec<CooldownEntry> {
        let mut out: Vec<CooldownEntry> = self
            .lock()
            .iter()
            .map(|(function, since)| CooldownEntry {
                function: function.clone(),
                idle_secs: now.saturating_duration_since(*since).as_secs(),
            })
            .collect();
        out.sort_by(|a, b| a.function.cmp(&b.function));
        out
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
