/// Event delivery
use crate::events::{Event, EventError, EventHandler, WireMessage};
use super::core::EventRegistry;
use super::stats::StatCounters;
use std::sync::Arc;
use tracing::{error, trace};

impl EventRegistry {
    /// Delivers `data` to every listener of `event_name`.
    ///
    /// Listeners are snapshotted first and invoked without holding the map
    /// lock, so a listener may subscribe or unsubscribe while running. A
    /// failing listener is logged and does not stop delivery to the others.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event_name: &str, data: &serde_json::Value) -> usize {
        StatCounters::bump(&self.counters.events_dispatched);

        let handlers: Vec<Arc<dyn EventHandler>> = match self.handlers.get(event_name) {
            Some(entry) => entry.iter().map(|registration| registration.handler.clone()).collect(),
            None => Vec::new(),
        };

        if handlers.is_empty() {
            StatCounters::bump(&self.counters.unhandled_events);
            trace!("No listeners for '{}'", event_name);
            return 0;
        }

        for handler in &handlers {
            if let Err(e) = handler.handle(data) {
                StatCounters::bump(&self.counters.handler_failures);
                error!(
                    "❌ Handler '{}' failed for '{}': {}",
                    handler.handler_name(),
                    event_name,
                    e
                );
            }
        }

        handlers.len()
    }

    /// Serializes a typed payload and dispatches it locally.
    pub fn dispatch_event<T: Event>(&self, event_name: &str, event: &T) -> Result<usize, EventError> {
        let data = event.to_value()?;
        Ok(self.dispatch(event_name, &data))
    }

    /// Delivers a decoded wire frame.
    pub fn dispatch_message(&self, message: &WireMessage) -> usize {
        self.dispatch(&message.event, &message.data)
    }
}
