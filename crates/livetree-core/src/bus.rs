//! Named-channel publish/subscribe.
//!
//! An `EventBus` is a plain value: whoever creates it owns it and hands
//! clones to the components that need it. Clones share one listener
//! registry, so a clone threaded down a recursion reaches the same
//! subscribers as the original.
//!
//! ## Delivery
//!
//! `emit` copies the channel's listener list before invoking anything.
//! Listeners run synchronously, in registration order, to completion.
//! A listener may subscribe or unsubscribe while an emit is in progress;
//! the change applies from the next emit on.
//!
//! ## Subscriptions
//!
//! `subscribe` returns a `Subscription` guard. Dropping the guard removes
//! the listener, so a component that stores its guard as a field can never
//! outlive its registration.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Channel used by subtree buses to clear a node-state field.
pub const RESET: &str = "reset";

/// Channel used by the global bus when a path is favorited.
pub const FAVORITE_ADD: &str = "favorite-add";

/// Channel used by the global bus when a favorite is removed.
pub const FAVORITE_DELETE: &str = "favorite-delete";

type Listener<P> = Rc<dyn Fn(&P)>;

struct Registry<P> {
    next_id: u64,
    channels: HashMap<String, Vec<(u64, Listener<P>)>>,
}

impl<P> Registry<P> {
    fn remove(&mut self, channel: &str, id: u64) {
        if let Some(listeners) = self.channels.get_mut(channel) {
            listeners.retain(|(listener_id, _)| *listener_id != id);
            if listeners.is_empty() {
                self.channels.remove(channel);
            }
        }
    }
}

/// Process-local channel registry carrying payloads of type `P`.
pub struct EventBus<P> {
    inner: Rc<RefCell<Registry<P>>>,
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: 'static> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.borrow();
        let mut channels: Vec<(&str, usize)> = registry
            .channels
            .iter()
            .map(|(name, listeners)| (name.as_str(), listeners.len()))
            .collect();
        channels.sort_unstable();
        f.debug_struct("EventBus")
            .field("channels", &channels)
            .finish()
    }
}

impl<P: 'static> EventBus<P> {
    /// Creates a bus with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                channels: HashMap::new(),
            })),
        }
    }

    /// Registers `listener` on `channel`.
    ///
    /// The listener stays registered until the returned guard is dropped.
    pub fn subscribe<F>(&self, channel: &str, listener: F) -> Subscription
    where
        F: Fn(&P) + 'static,
    {
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id = registry.next_id.wrapping_add(1);
            registry
                .channels
                .entry(channel.to_string())
                .or_default()
                .push((id, Rc::new(listener)));
            id
        };

        let registry: Weak<RefCell<Registry<P>>> = Rc::downgrade(&self.inner);
        let channel = channel.to_string();
        Subscription {
            release: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.borrow_mut().remove(&channel, id);
                }
            })),
        }
    }

    /// Delivers `payload` to every listener currently on `channel`.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, channel: &str, payload: &P) -> usize {
        let listeners: Vec<Listener<P>> = self
            .inner
            .borrow()
            .channels
            .get(channel)
            .map(|listeners| {
                listeners
                    .iter()
                    .map(|(_, listener)| Rc::clone(listener))
                    .collect()
            })
            .unwrap_or_default();

        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    /// Number of listeners registered on `channel`.
    pub fn listener_count(&self, channel: &str) -> usize {
        self.inner
            .borrow()
            .channels
            .get(channel)
            .map_or(0, Vec::len)
    }

    /// Returns true if both handles share one registry.
    pub fn same_bus(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Guard that unregisters its listener when dropped.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        let _a = bus.subscribe("tick", move |n| first.borrow_mut().push(("a", *n)));
        let second = Rc::clone(&seen);
        let _b = bus.subscribe("tick", move |n| second.borrow_mut().push(("b", *n)));

        assert_eq!(bus.emit("tick", &7), 2);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus: EventBus<()> = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let sub = bus.subscribe(RESET, move |()| counter.set(counter.get() + 1));
        bus.emit(RESET, &());
        drop(sub);
        bus.emit(RESET, &());

        assert_eq!(hits.get(), 1);
        assert_eq!(bus.listener_count(RESET), 0);
    }

    #[test]
    fn test_channels_are_isolated() {
        let bus: EventBus<&'static str> = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let _sub = bus.subscribe(FAVORITE_ADD, move |_| counter.set(counter.get() + 1));

        assert_eq!(bus.emit(FAVORITE_DELETE, &"x"), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_separate_buses_do_not_share_listeners() {
        let left: EventBus<()> = EventBus::new();
        let right: EventBus<()> = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let _sub = left.subscribe(RESET, move |()| counter.set(counter.get() + 1));
        right.emit(RESET, &());

        assert_eq!(hits.get(), 0);
        assert!(!left.same_bus(&right));
        assert!(left.same_bus(&left.clone()));
    }

    #[test]
    fn test_subscribe_during_emit_applies_next_time() {
        let bus: EventBus<()> = EventBus::new();
        let late_hits = Rc::new(Cell::new(0));
        let parked: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let handle = bus.clone();
        let hits = Rc::clone(&late_hits);
        let store = Rc::clone(&parked);
        let _outer = bus.subscribe(RESET, move |()| {
            let hits = Rc::clone(&hits);
            let sub = handle.subscribe(RESET, move |()| hits.set(hits.get() + 1));
            store.borrow_mut().push(sub);
        });

        assert_eq!(bus.emit(RESET, &()), 1);
        assert_eq!(late_hits.get(), 0);

        bus.emit(RESET, &());
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_emit_does_not_skip_others() {
        let bus: EventBus<()> = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim);
        let _killer = bus.subscribe(RESET, move |()| {
            slot.borrow_mut().take();
        });
        let counter = Rc::clone(&hits);
        *victim.borrow_mut() =
            Some(bus.subscribe(RESET, move |()| counter.set(counter.get() + 1)));
        let counter = Rc::clone(&hits);
        let _tail = bus.subscribe(RESET, move |()| counter.set(counter.get() + 10));

        // The snapshot taken at emit time still includes the dropped listener.
        bus.emit(RESET, &());
        assert_eq!(hits.get(), 11);

        bus.emit(RESET, &());
        assert_eq!(hits.get(), 21);
        assert_eq!(bus.listener_count(RESET), 2);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus: EventBus<()> = EventBus::new();
        let sub = bus.subscribe(RESET, |()| {});
        drop(bus);
        drop(sub);
    }
}
