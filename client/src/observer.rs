// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use alloc::sync::Arc;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use crate::lock;

/// Identifies one subscription, for [`unsubscribe`][`crate::Connection::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A list of callbacks notified in registration order.
pub(crate) struct Observers<T> {
    list: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            list: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, id: SubscriptionId, callback: Callback<T>) {
        lock(&self.list).push((id, callback));
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut list = lock(&self.list);
        let before = list.len();
        list.retain(|(other, _)| *other != id);
        list.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.list).len()
    }

    /// Call every callback with `value`, returning how many returned
    /// normally. A panicking callback is logged and skipped.
    pub(crate) fn notify(&self, value: &T) -> usize {
        let snapshot: Vec<_> = lock(&self.list).clone();
        let mut delivered = 0;
        for (id, callback) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| callback(value))) {
                Ok(()) => delivered += 1,
                Err(_) => log::warn!("subscriber {} panicked, continuing", id.0),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_in_order() {
        let observers = Observers::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3u64 {
            let seen = seen.clone();
            observers.subscribe(
                SubscriptionId(n),
                Arc::new(move |value: &u32| seen.lock().unwrap().push((n, *value))),
            );
        }
        assert_eq!(observers.notify(&7), 3);
        assert_eq!(*seen.lock().unwrap(), vec![(0, 7), (1, 7), (2, 7)]);

        assert!(observers.unsubscribe(SubscriptionId(1)));
        assert!(!observers.unsubscribe(SubscriptionId(1)));
        assert_eq!(observers.len(), 2);
    }

    #[test]
    fn panics_are_isolated() {
        let observers = Observers::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        observers.subscribe(SubscriptionId(0), Arc::new(|_: &u32| panic!("boom")));
        let inner = seen.clone();
        observers.subscribe(
            SubscriptionId(1),
            Arc::new(move |value: &u32| inner.lock().unwrap().push(*value)),
        );
        assert_eq!(observers.notify(&1), 1);
        assert_eq!(observers.notify(&2), 1);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn callback_may_subscribe() {
        let observers = Arc::new(Observers::<u32>::new());
        let weak = Arc::downgrade(&observers);
        observers.subscribe(
            SubscriptionId(0),
            Arc::new(move |_: &u32| {
                if let Some(observers) = weak.upgrade() {
                    observers.subscribe(SubscriptionId(1), Arc::new(|_: &u32| ()));
                }
            }),
        );
        assert_eq!(observers.notify(&0), 1);
        assert_eq!(observers.len(), 2);
    }
}
