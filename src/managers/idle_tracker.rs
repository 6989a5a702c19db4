//! Idle Tracker.
//!
//! Remembers when each tab was last interacted with. Knows nothing about
//! surfaces or backend state; the reconciler stamps it and housekeeping reads it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::tab::TabId;

/// Trait defining idle bookkeeping operations.
pub trait IdleTrackerTrait {
    fn touch(&mut self, tab_id: &str, now: Instant);
    fn stamp_missing<'a, I>(&mut self, tab_ids: I, now: Instant)
    where
        I: IntoIterator<Item = &'a str>;
    fn prune<'a, I>(&mut self, known: I) -> Vec<TabId>
    where
        I: IntoIterator<Item = &'a str>;
    fn remove(&mut self, tab_id: &str) -> bool;
    fn last_interaction(&self, tab_id: &str) -> Option<Instant>;
    fn idle_for(&self, tab_id: &str, now: Instant) -> Option<Duration>;
    fn entries(&self) -> &HashMap<TabId, Instant>;
}

/// Per-tab last-interaction timestamps.
#[derive(Debug, Default, Clone)]
pub struct IdleTracker {
    last_interaction_at: HashMap<TabId, Instant>,
}

impl IdleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.last_interaction_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_interaction_at.is_empty()
    }
}

impl IdleTrackerTrait for IdleTracker {
    fn touch(&mut self, tab_id: &str, now: Instant) {
        self.last_interaction_at.insert(tab_id.to_string(), now);
    }

    /// Stamps `now` for ids without an entry; existing stamps are kept.
    fn stamp_missing<'a, I>(&mut self, tab_ids: I, now: Instant)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in tab_ids {
            self.last_interaction_at
                .entry(id.to_string())
                .or_insert(now);
        }
    }

    /// Drops entries whose id is not in `known`. Returns the dropped ids.
    fn prune<'a, I>(&mut self, known: I) -> Vec<TabId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: std::collections::HashSet<&str> = known.into_iter().collect();
        let stale: Vec<TabId> = self
            .last_interaction_at
            .keys()
            .filter(|id| !known.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &stale {
            self.last_interaction_at.remove(id);
        }
        stale
    }

    fn remove(&mut self, tab_id: &str) -> bool {
        self.last_interaction_at.remove(tab_id).is_some()
    }

    fn last_interaction(&self, tab_id: &str) -> Option<Instant> {
        self.last_interaction_at.get(tab_id).copied()
    }

    fn idle_for(&self, tab_id: &str, now: Instant) -> Option<Duration> {
        self.last_interaction(tab_id)
            .map(|at| now.saturating_duration_since(at))
    }

    fn entries(&self) -> &HashMap<TabId, Instant> {
        &self.last_interaction_at
    }
}
