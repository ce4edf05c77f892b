/// Statistics tracking for the listener registry
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of registry activity
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegistryStats {
    /// Number of listeners currently registered across all events
    pub total_handlers: usize,
    /// Number of distinct event names with at least one listener
    pub registered_events: usize,
    /// Events dispatched since the registry was created
    pub events_dispatched: u64,
    /// Dispatched events that found no listener
    pub unhandled_events: u64,
    /// Listener invocations that returned an error
    pub handler_failures: u64,
}

#[derive(Debug, Default)]
pub(super) struct StatCounters {
    pub(super) events_dispatched: AtomicU64,
    pub(super) unhandled_events: AtomicU64,
    pub(super) handler_failures: AtomicU64,
}

impl StatCounters {
    pub(super) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
