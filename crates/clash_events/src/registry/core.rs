/// Core EventRegistry implementation
use crate::events::EventHandler;
use super::stats::{EventRegistryStats, StatCounters};
use compact_str::CompactString;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier assigned to every registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(super) struct Registration {
    pub(super) id: ListenerId,
    pub(super) handler: Arc<dyn EventHandler>,
}

/// Registry of event name → listeners for one connection.
///
/// Lock-free for readers through `DashMap`. Listener identity is the `Arc`
/// allocation of the handler: registering the same `Arc` twice for one event
/// yields a single registration, so delivery is never duplicated and a single
/// removal clears it.
///
/// The registry is meant to live behind an `Arc`; [`Subscription`] handles
/// keep a weak reference back to it.
///
/// [`Subscription`]: super::Subscription
pub struct EventRegistry {
    pub(super) handlers: DashMap<CompactString, Vec<Registration>>,
    pub(super) next_id: AtomicU64,
    pub(super) counters: StatCounters,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("events", &self.handlers.len())
            .field("handlers", &self.total_handlers())
            .finish()
    }
}

impl EventRegistry {
    /// Creates a registry with no listeners.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            next_id: AtomicU64::new(1),
            counters: StatCounters::default(),
        }
    }

    /// Convenience constructor returning the registry already shared.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub(super) fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Current registry statistics.
    pub fn stats(&self) -> EventRegistryStats {
        EventRegistryStats {
            total_handlers: self.total_handlers(),
            registered_events: self.handlers.len(),
            events_dispatched: StatCounters::read(&self.counters.events_dispatched),
            unhandled_events: StatCounters::read(&self.counters.unhandled_events),
            handler_failures: StatCounters::read(&self.counters.handler_failures),
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn same_handler(a: &Arc<dyn EventHandler>, b: &Arc<dyn EventHandler>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
