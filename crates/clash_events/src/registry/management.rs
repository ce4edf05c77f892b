/// Registry management and introspection
use super::core::{EventRegistry, ListenerId};
use tracing::info;

impl EventRegistry {
    /// Removes every listener for `event_name`, returning how many were removed.
    pub fn remove_handlers(&self, event_name: &str) -> usize {
        let removed = self
            .handlers
            .remove(event_name)
            .map(|(_, registrations)| registrations.len())
            .unwrap_or(0);

        if removed > 0 {
            info!("🗑️ Removed {} handlers for '{}'", removed, event_name);
        }
        removed
    }

    /// Removes every listener for every event.
    pub fn clear(&self) -> usize {
        let removed = self.total_handlers();
        self.handlers.clear();
        removed
    }

    /// Gets all event names that currently have listeners
    pub fn registered_events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.handlers.iter().map(|entry| entry.key().to_string()).collect();
        events.sort();
        events
    }

    #[inline]
    pub fn has_handlers(&self, event_name: &str) -> bool {
        self.handlers.contains_key(event_name)
    }

    #[inline]
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers.get(event_name).map(|entry| entry.len()).unwrap_or(0)
    }

    /// Number of registrations across all events.
    pub fn total_handlers(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }

    pub(super) fn contains_listener(&self, event_name: &str, id: ListenerId) -> bool {
        self.handlers
            .get(event_name)
            .is_some_and(|entry| entry.iter().any(|registration| registration.id == id))
    }
}
