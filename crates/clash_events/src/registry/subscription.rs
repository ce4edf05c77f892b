//! Capability handle for a single registration.

use super::core::{EventRegistry, ListenerId};
use compact_str::CompactString;
use std::fmt;
use std::sync::Weak;

/// Owns one listener registration.
///
/// Dropping the handle or calling [`Subscription::unsubscribe`] removes
/// exactly the registration it was issued for, so every `on` is paired with
/// its removal without comparing callbacks. [`Subscription::detach`] keeps the
/// listener for the lifetime of the registry instead.
#[must_use = "dropping a Subscription immediately removes its listener"]
pub struct Subscription {
    registry: Weak<EventRegistry>,
    event_name: CompactString,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    pub(super) fn new(registry: Weak<EventRegistry>, event_name: CompactString, id: ListenerId) -> Self {
        Self {
            registry,
            event_name,
            id,
            active: true,
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// True while the registration still exists in a live registry.
    pub fn is_active(&self) -> bool {
        self.active
            && self
                .registry
                .upgrade()
                .is_some_and(|registry| registry.contains_listener(&self.event_name, self.id))
    }

    /// Removes the registration. Returns `true` if it was still present.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    /// Gives up ownership without removing the registration.
    pub fn detach(mut self) -> ListenerId {
        self.active = false;
        self.id
    }

    fn release(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove_listener(&self.event_name, self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event_name", &self.event_name)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
