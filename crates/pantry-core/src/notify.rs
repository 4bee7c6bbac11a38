use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

/// What part of the engine state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Items,
    Lists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(Change)>;

#[derive(Default)]
struct Observers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
    /// Ids whose callbacks are taken out for an ongoing delivery.
    in_flight: Vec<SubscriptionId>,
    /// In-flight ids unsubscribed before their delivery finished.
    dropped: Vec<SubscriptionId>,
}

/// Shared observer list. Clones deliver to the same subscribers.
///
/// Delivery is synchronous: `notify` returns after every callback ran.
/// Callbacks may subscribe, unsubscribe (themselves included) or count
/// subscribers while a notification is running. A subscriber added during
/// delivery first hears the next change; one removed during delivery is not
/// called again, including later in the same round.
#[derive(Clone, Default)]
pub struct Notifier {
    observers: Rc<RefCell<Observers>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnMut(Change) + 'static,
    {
        let mut observers = self.observers.borrow_mut();
        let id = SubscriptionId(observers.next_id);
        observers.next_id += 1;
        observers.callbacks.push((id, Box::new(callback)));
        debug!(id = id.0, "added change subscriber");
        id
    }

    /// Returns `false` when the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.callbacks.len();
        observers.callbacks.retain(|(existing, _)| *existing != id);
        if observers.callbacks.len() != before {
            debug!(id = id.0, "removed change subscriber");
            return true;
        }
        if observers.in_flight.contains(&id) && !observers.dropped.contains(&id) {
            debug!(id = id.0, "removed change subscriber during delivery");
            observers.dropped.push(id);
            return true;
        }
        false
    }

    pub fn subscriber_count(&self) -> usize {
        let observers = self.observers.borrow();
        observers.callbacks.len() + observers.in_flight.len() - observers.dropped.len()
    }

    pub fn notify(&self, change: Change) {
        // No borrow is held while callbacks run, so they can reach back in.
        let mut delivering = {
            let mut observers = self.observers.borrow_mut();
            let taken = std::mem::take(&mut observers.callbacks);
            observers.in_flight.extend(taken.iter().map(|(id, _)| *id));
            taken
        };
        trace!(?change, subscribers = delivering.len(), "notifying");

        for (id, callback) in delivering.iter_mut() {
            if self.observers.borrow().dropped.contains(id) {
                continue;
            }
            callback(change);
        }

        let own: Vec<SubscriptionId> = delivering.iter().map(|(id, _)| *id).collect();
        let mut observers = self.observers.borrow_mut();
        let dropped = std::mem::take(&mut observers.dropped);
        delivering.retain(|(id, _)| !dropped.contains(id));
        observers.dropped = dropped.into_iter().filter(|id| !own.contains(id)).collect();
        observers.in_flight.retain(|id| !own.contains(id));

        let added = std::mem::replace(&mut observers.callbacks, delivering);
        observers.callbacks.extend(added);
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
