//! Auth-state change subscriptions.
//!
//! Handlers run synchronously, in registration order, in the order events are
//! emitted. A late subscriber does not see earlier events.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::models::AuthEvent;

type Handler = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct AuthEvents {
    registry: Arc<Mutex<Registry>>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; it stays registered until the returned
    /// subscription is unsubscribed or dropped
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver an event to every current subscriber
    pub fn emit(&self, event: &AuthEvent) {
        // Snapshot so handlers may subscribe or unsubscribe while running
        let handlers: Vec<Handler> = lock(&self.registry)
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        tracing::debug!(?event, subscribers = handlers.len(), "Emitting auth event");
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

/// Handle returned by [`AuthEvents::subscribe`]
#[must_use = "dropping a subscription unsubscribes it"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).handlers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::User;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: "staff@library.test".to_string(),
            created_at: Utc::now(),
            last_sign_in_at: None,
        }
    }

    #[test]
    fn test_events_delivered_in_order() {
        let events = AuthEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = events.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        events.emit(&AuthEvent::SignedIn(user()));
        events.emit(&AuthEvent::SignedOut);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![AuthEvent::SignedIn(user()), AuthEvent::SignedOut]
        );
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let events = AuthEvents::new();
        events.emit(&AuthEvent::SignedOut);

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let _sub = events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let events = AuthEvents::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let sub = events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(&AuthEvent::SignedOut);
        sub.unsubscribe();
        events.emit(&AuthEvent::SignedOut);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let events = AuthEvents::new();
        {
            let _sub = events.subscribe(|_| {});
            assert_eq!(events.subscriber_count(), 1);
        }
        assert_eq!(events.subscriber_count(), 0);
    }
}
