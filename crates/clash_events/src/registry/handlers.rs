/// Listener registration methods
use crate::events::{Event, EventError, EventHandler, TypedEventHandler};
use super::core::{same_handler, EventRegistry, ListenerId, Registration};
use super::subscription::Subscription;
use compact_str::CompactString;
use std::sync::Arc;
use tracing::debug;

impl EventRegistry {
    /// Registers `handler` for `event_name` and returns the handle that owns
    /// the registration.
    ///
    /// If the very same `Arc` is already registered for this event, no second
    /// registration is made; the returned handle refers to the existing one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use clash_events::{EventRegistry, EventHandler, TypedEventHandler, ErrorEvent};
    /// use std::sync::Arc;
    ///
    /// let registry = EventRegistry::shared();
    /// let handler: Arc<dyn EventHandler> = Arc::new(TypedEventHandler::new(
    ///     "log_errors",
    ///     |event: ErrorEvent| {
    ///         println!("server error: {}", event.message);
    ///         Ok(())
    ///     },
    /// ));
    ///
    /// let subscription = registry.on("game_error", handler);
    /// assert_eq!(registry.handler_count("game_error"), 1);
    /// drop(subscription);
    /// assert_eq!(registry.handler_count("game_error"), 0);
    /// ```
    pub fn on(self: &Arc<Self>, event_name: &str, handler: Arc<dyn EventHandler>) -> Subscription {
        let id = self.register(event_name, handler);
        Subscription::new(Arc::downgrade(self), CompactString::from(event_name), id)
    }

    /// Registers a closure over a typed payload.
    pub fn on_typed<T, F>(self: &Arc<Self>, event_name: &str, handler: F) -> Subscription
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let handler_name = format!("{event_name}:{}", T::type_name());
        self.on(event_name, Arc::new(TypedEventHandler::new(handler_name, handler)))
    }

    /// Removes the registration of exactly this `handler` for `event_name`.
    ///
    /// Returns `true` if a registration was removed.
    pub fn off(&self, event_name: &str, handler: &Arc<dyn EventHandler>) -> bool {
        let removed = match self.handlers.get_mut(event_name) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|registration| !same_handler(&registration.handler, handler));
                before != entry.len()
            }
            None => false,
        };
        self.prune(event_name);

        if removed {
            debug!("🗑️ Removed handler '{}' from '{}'", handler.handler_name(), event_name);
        }
        removed
    }

    fn register(&self, event_name: &str, handler: Arc<dyn EventHandler>) -> ListenerId {
        let mut entry = self
            .handlers
            .entry(CompactString::from(event_name))
            .or_default();

        if let Some(existing) = entry
            .iter()
            .find(|registration| same_handler(&registration.handler, &handler))
        {
            debug!(
                "Handler '{}' already registered for '{}' as {}",
                handler.handler_name(),
                event_name,
                existing.id
            );
            return existing.id;
        }

        let id = self.allocate_id();
        debug!("📝 Registered handler '{}' for '{}' as {}", handler.handler_name(), event_name, id);
        entry.push(Registration { id, handler });
        id
    }

    /// Removes a registration by id. Used by [`Subscription`].
    pub(super) fn remove_listener(&self, event_name: &str, id: ListenerId) -> bool {
        let removed = match self.handlers.get_mut(event_name) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|registration| registration.id != id);
                before != entry.len()
            }
            None => false,
        };
        self.prune(event_name);
        removed
    }

    /// Drops the event key once its last listener is gone.
    pub(super) fn prune(&self, event_name: &str) {
        self.handlers.remove_if(event_name, |_, registrations| registrations.is_empty());
    }
}
