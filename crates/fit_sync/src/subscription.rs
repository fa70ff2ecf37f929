//! Callback registries with ordered delivery and idempotent unsubscribe.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Handle returned by `subscribe` calls.
///
/// Dropping the handle keeps the callback registered; only
/// [`Subscription::unsubscribe`] removes it. Calling `unsubscribe` more than
/// once, or after the publisher is gone, is a no-op.
pub struct Subscription {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Stop receiving callbacks.
    pub fn unsubscribe(&self) {
        let cancel = lock(&self.cancel).take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether `unsubscribe` has already run.
    pub fn is_closed(&self) -> bool {
        lock(&self.cancel).is_none()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Entries<T> = Mutex<BTreeMap<u64, Callback<T>>>;

/// A value waiting to be delivered.
enum Pending<T> {
    /// For every listener registered before `upto`.
    All { value: T, upto: u64 },
    /// Replay for a single new listener.
    One { id: u64, value: T },
}

struct Outbox<T> {
    next_id: u64,
    pending: VecDeque<Pending<T>>,
}

/// Ordered set of callbacks keyed by registration id.
///
/// Values are staged in order (callers stage while holding the lock that
/// guards the value) and delivered by [`Listeners::flush`]. Only one thread
/// delivers at a time, so every listener sees values in staging order. A
/// flush that finds another delivery in progress, including a reentrant one
/// from inside a callback, leaves its values to that delivery.
pub(crate) struct Listeners<T> {
    entries: Arc<Entries<T>>,
    outbox: Mutex<Outbox<T>>,
    delivering: AtomicBool,
}

impl<T: 'static> Listeners<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            outbox: Mutex::new(Outbox {
                next_id: 0,
                pending: VecDeque::new(),
            }),
            delivering: AtomicBool::new(false),
        }
    }

    /// Register `callback` without a replay.
    #[cfg(test)]
    pub(crate) fn add(&self, callback: Callback<T>) -> Subscription {
        let id = {
            let mut outbox = lock(&self.outbox);
            let id = outbox.next_id;
            outbox.next_id += 1;
            lock(&self.entries).insert(id, callback);
            id
        };
        self.subscription(id)
    }

    /// Register `callback` and stage `current` for it alone. Values staged
    /// earlier are not delivered to it. The returned subscription only holds
    /// a weak reference, so it outlives the registry safely.
    pub(crate) fn add_with_replay(&self, callback: Callback<T>, current: T) -> Subscription {
        let id = {
            let mut outbox = lock(&self.outbox);
            let id = outbox.next_id;
            outbox.next_id += 1;
            lock(&self.entries).insert(id, callback);
            outbox.pending.push_back(Pending::One { id, value: current });
            id
        };
        self.subscription(id)
    }

    /// Queue `value` for every listener registered so far.
    pub(crate) fn stage(&self, value: T) {
        let mut outbox = lock(&self.outbox);
        let upto = outbox.next_id;
        outbox.pending.push_back(Pending::All { value, upto });
    }

    /// Deliver staged values unless another delivery is running.
    pub(crate) fn flush(&self) {
        loop {
            if self.delivering.swap(true, Ordering::SeqCst) {
                return;
            }
            let guard = Delivering(&self.delivering);
            loop {
                // the outbox lock must not be held while callbacks run
                let next = lock(&self.outbox).pending.pop_front();
                match next {
                    Some(pending) => self.deliver(pending),
                    None => break,
                }
            }
            drop(guard);

            if lock(&self.outbox).pending.is_empty() {
                return;
            }
        }
    }

    /// Stage `value` and flush.
    pub(crate) fn emit(&self, value: T) {
        self.stage(value);
        self.flush();
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    fn deliver(&self, pending: Pending<T>) {
        let (value, callbacks): (T, Vec<Callback<T>>) = {
            let entries = lock(&self.entries);
            match pending {
                Pending::All { value, upto } => {
                    let callbacks = entries.range(..upto).map(|(_, cb)| cb.clone()).collect();
                    (value, callbacks)
                }
                Pending::One { id, value } => (value, entries.get(&id).cloned().into_iter().collect()),
            }
        };

        for callback in callbacks {
            callback(&value);
        }
    }

    fn subscription(&self, id: u64) -> Subscription {
        let entries: Weak<Entries<T>> = Arc::downgrade(&self.entries);
        Subscription::new(move || {
            if let Some(entries) = entries.upgrade() {
                lock(&entries).remove(&id);
            }
        })
    }
}

/// Clears the delivering flag even if a callback panics.
struct Delivering<'a>(&'a AtomicBool);

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
