//! Tests for the listener registry

#[cfg(test)]
mod tests {
    use crate::events::{ErrorEvent, EventError, EventHandler, TypedEventHandler, WireMessage};
    use crate::registry::EventRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counting_handler(counter: Arc<AtomicUsize>) -> Arc<dyn EventHandler> {
        Arc::new(TypedEventHandler::new("counter", move |_event: serde_json::Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
    }

    #[test]
    fn test_dispatch_reaches_every_listener() {
        let registry = EventRegistry::shared();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let _a = registry.on("match_found", counting_handler(first.clone()));
        let _b = registry.on("match_found", counting_handler(second.clone()));

        let delivered = registry.dispatch("match_found", &serde_json::json!({}));

        assert_eq!(delivered, 2);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_registration_then_single_off_removes_delivery() {
        let registry = EventRegistry::shared();
        let counter = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(counter.clone());

        let first = registry.on("state_update", handler.clone()).detach();
        let second = registry.on("state_update", handler.clone()).detach();
        assert_eq!(first, second);
        assert_eq!(registry.handler_count("state_update"), 1);

        registry.dispatch("state_update", &serde_json::json!({}));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(registry.off("state_update", &handler));
        registry.dispatch("state_update", &serde_json::json!({}));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!registry.has_handlers("state_update"));
        assert!(!registry.off("state_update", &handler));
    }

    #[test]
    fn test_off_only_removes_matching_handler() {
        let registry = EventRegistry::shared();
        let kept_counter = Arc::new(AtomicUsize::new(0));
        let removed_counter = Arc::new(AtomicUsize::new(0));
        let kept = counting_handler(kept_counter.clone());
        let removed = counting_handler(removed_counter.clone());

        registry.on("game_error", kept.clone()).detach();
        registry.on("game_error", removed.clone()).detach();
        registry.off("game_error", &removed);

        registry.dispatch("game_error", &serde_json::json!({ "message": "boom" }));
        assert_eq!(kept_counter.load(Ordering::SeqCst), 1);
        assert_eq!(removed_counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropping_subscription_removes_exactly_that_listener() {
        let registry = EventRegistry::shared();
        let counter = Arc::new(AtomicUsize::new(0));

        let keep = registry.on("match_aborted", counting_handler(counter.clone()));
        let gone = registry.on("match_aborted", counting_handler(counter.clone()));
        assert_eq!(registry.handler_count("match_aborted"), 2);

        drop(gone);
        assert_eq!(registry.handler_count("match_aborted"), 1);
        assert!(keep.is_active());

        assert!(keep.unsubscribe());
        assert_eq!(registry.total_handlers(), 0);
        assert!(registry.registered_events().is_empty());
    }

    #[test]
    fn test_subscription_outliving_registry_is_harmless() {
        let registry = EventRegistry::shared();
        let subscription = registry.on_typed("auth_error", |_event: ErrorEvent| Ok(()));
        drop(registry);
        assert!(!subscription.is_active());
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_listener_may_unsubscribe_during_dispatch() {
        let registry = EventRegistry::shared();
        let slot: Arc<Mutex<Option<crate::registry::Subscription>>> = Arc::new(Mutex::new(None));
        let slot_clone = slot.clone();

        let subscription = registry.on_typed("match_completed", move |_event: serde_json::Value| {
            if let Some(subscription) = slot_clone.lock().unwrap().take() {
                subscription.unsubscribe();
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(subscription);

        assert_eq!(registry.dispatch("match_completed", &serde_json::json!({})), 1);
        assert_eq!(registry.dispatch("match_completed", &serde_json::json!({})), 0);
    }

    #[test]
    fn test_failing_handler_does_not_stop_delivery() {
        let registry = EventRegistry::shared();
        let counter = Arc::new(AtomicUsize::new(0));

        let _failing = registry.on_typed("game_start", |_event: serde_json::Value| {
            Err(EventError::HandlerExecution("nope".to_string()))
        });
        let _counting = registry.on("game_start", counting_handler(counter.clone()));

        registry.dispatch("game_start", &serde_json::json!({}));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.stats().handler_failures, 1);
    }

    #[test]
    fn test_stats_track_unhandled_events() {
        let registry = EventRegistry::shared();
        let _sub = registry.on_typed("connect", |_event: serde_json::Value| Ok(()));

        registry.dispatch("connect", &serde_json::Value::Null);
        let message = WireMessage::decode(r#"{"event":"unknown_event","data":{}}"#).unwrap();
        registry.dispatch_message(&message);

        let stats = registry.stats();
        assert_eq!(stats.events_dispatched, 2);
        assert_eq!(stats.unhandled_events, 1);
        assert_eq!(stats.total_handlers, 1);
        assert_eq!(stats.registered_events, 1);
    }

    #[test]
    fn test_remove_handlers_and_clear() {
        let registry = EventRegistry::shared();
        registry.on_typed("a", |_event: serde_json::Value| Ok(())).detach();
        registry.on_typed("a", |_event: serde_json::Value| Ok(())).detach();
        registry.on_typed("b", |_event: serde_json::Value| Ok(())).detach();

        assert_eq!(registry.remove_handlers("a"), 2);
        assert_eq!(registry.registered_events(), vec!["b".to_string()]);
        assert_eq!(registry.clear(), 1);
        assert_eq!(registry.total_handlers(), 0);
    }
}
