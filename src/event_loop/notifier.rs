//! Fan-out notifications over crossbeam channels.
//!
//! A `Notifier` plays the role of a signal: each subscriber owns a
//! `Receiver` and drains it at its own pace, so nobody has to filter
//! traffic meant for someone else. Dropping the receiver unsubscribes.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::cell::RefCell;

/// Broadcasts cloned values to every live subscriber.
pub struct Notifier<T> {
    subscribers: RefCell<Vec<Sender<T>>>,
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<T> Notifier<T> {
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe to future notifications.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    /// Number of subscribers that have not yet been pruned.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.subscribers.borrow_mut().clear();
    }
}

impl<T: Clone> Notifier<T> {
    /// Send `value` to every subscriber, pruning those that hung up.
    pub fn emit(&self, value: T) {
        let mut subscribers = self.subscribers.borrow_mut();
        let Some((last, rest)) = subscribers.split_last() else {
            return;
        };
        let mut dead = Vec::new();
        for (i, tx) in rest.iter().enumerate() {
            if tx.send(value.clone()).is_err() {
                dead.push(i);
            }
        }
        if last.send(value).is_err() {
            dead.push(rest.len());
        }
        for i in dead.into_iter().rev() {
            subscribers.remove(i);
        }
    }
}
