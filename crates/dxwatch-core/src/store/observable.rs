// ── Generic reactive store ──
//
// One `Arc<S>` snapshot, copy-on-write updates, and two ways to observe
// them: synchronous listeners (exactly one call per publication) and
// async `watch` subscriptions for render loops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;
use tracing::trace;

use crate::stream::StoreStream;

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Listeners<S> {
    next_id: u64,
    entries: Vec<(u64, Listener<S>)>,
}

/// Observable container holding the current snapshot of `S`.
///
/// Writers never mutate a published snapshot: [`set_state`](Self::set_state)
/// clones the current value, applies the change, and swaps in a fresh
/// `Arc`. Readers holding an older `Arc` keep seeing the old value intact.
pub struct Store<S: Clone + Send + Sync + 'static> {
    name: &'static str,
    initial: Arc<S>,

    /// Current snapshot. The channel's write lock serializes publications.
    snapshot: watch::Sender<Arc<S>>,

    /// Bumped once per publication, under the snapshot write lock.
    version: AtomicU64,

    listeners: Arc<Mutex<Listeners<S>>>,
}

impl<S: Clone + Send + Sync + 'static> Store<S> {
    /// Create a store whose current and reset snapshot is `initial`.
    pub fn new(name: &'static str, initial: S) -> Self {
        let initial = Arc::new(initial);
        let (snapshot, _) = watch::channel(Arc::clone(&initial));

        Self {
            name,
            initial,
            snapshot,
            version: AtomicU64::new(0),
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Diagnostic name (e.g. `"metrics-store"`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The current snapshot (cheap `Arc` clone).
    pub fn get_state(&self) -> Arc<S> {
        self.snapshot.borrow().clone()
    }

    /// The snapshot [`reset`](Self::reset) restores.
    pub fn initial_state(&self) -> Arc<S> {
        Arc::clone(&self.initial)
    }

    /// Number of publications since construction.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Apply a partial update and publish the result.
    ///
    /// `update` receives a private copy of the current snapshot; fields it
    /// doesn't touch carry over unchanged. Collection fields are replaced
    /// wholesale by assigning a new value.
    pub fn set_state(&self, update: impl FnOnce(&mut S)) {
        self.publish(|current| {
            let mut next = S::clone(current);
            update(&mut next);
            next
        });
    }

    /// Replace the whole snapshot.
    pub fn replace(&self, next: S) {
        self.publish(|_| next);
    }

    /// Restore the initial snapshot in a single publication.
    pub fn reset(&self) {
        let initial = S::clone(&self.initial);
        self.publish(|_| initial);
    }

    /// Register a listener called with the new snapshot after every
    /// publication. The listener stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    ///
    /// Listeners run on the writer's thread after the snapshot is
    /// visible, so reading the store from inside one is fine.
    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            let id = guard.next_id;
            guard.next_id += 1;
            guard.entries.push((id, Arc::new(listener)));
            id
        };

        let registry: Weak<Mutex<Listeners<S>>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entries
                    .retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Async subscription to snapshot changes.
    pub fn watch(&self) -> StoreStream<S> {
        StoreStream::new(self.snapshot.subscribe())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn publish(&self, build: impl FnOnce(&S) -> S) {
        let mut published = None;
        let mut version = 0;

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let next = Arc::new(build(snap));
            *snap = Arc::clone(&next);
            version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
            published = Some(next);
        });

        let Some(published) = published else {
            return;
        };
        trace!(store = self.name, version, "snapshot published");

        let listeners: Vec<Listener<S>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&published);
        }
    }
}

/// Handle returned by [`Store::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Sample {
        label: String,
        items: Vec<u32>,
        count: u32,
    }

    fn counter(store: &Store<Sample>) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let sub = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, sub)
    }

    #[test]
    fn set_state_merges_untouched_fields() {
        let store = Store::new("sample", Sample::default());
        store.set_state(|s| s.label = "a".into());
        store.set_state(|s| s.count = 3);

        let snap = store.get_state();
        assert_eq!(snap.label, "a");
        assert_eq!(snap.count, 3);
    }

    #[test]
    fn collection_fields_are_replaced_not_merged() {
        let store = Store::new(
            "sample",
            Sample {
                items: vec![1, 2, 3],
                ..Sample::default()
            },
        );
        store.set_state(|s| s.items = vec![9]);
        assert_eq!(store.get_state().items, vec![9]);
    }

    #[test]
    fn old_snapshots_are_never_mutated() {
        let store = Store::new("sample", Sample::default());
        let before = store.get_state();
        store.set_state(|s| s.count = 7);

        assert_eq!(before.count, 0);
        assert_eq!(store.get_state().count, 7);
    }

    #[test]
    fn every_write_notifies_exactly_once() {
        let store = Store::new("sample", Sample::default());
        let (hits, _sub) = counter(&store);

        store.set_state(|s| s.count = 1);
        store.replace(Sample::default());
        store.reset();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn listener_sees_post_update_snapshot() {
        let store = Arc::new(Store::new("sample", Sample::default()));
        let observed = Arc::new(Mutex::new(Vec::new()));

        let reader = Arc::clone(&store);
        let log = Arc::clone(&observed);
        let _sub = store.subscribe(move |snap: &Sample| {
            // The store must already hold the value being announced.
            let current = reader.get_state();
            log.lock().unwrap().push((snap.count, current.count));
        });

        store.set_state(|s| s.count = 5);
        store.set_state(|s| s.count = 6);

        assert_eq!(*observed.lock().unwrap(), vec![(5, 5), (6, 6)]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = Store::new("sample", Sample::default());
        let (hits, sub) = counter(&store);
        assert_eq!(store.listener_count(), 1);

        store.set_state(|s| s.count = 1);
        drop(sub);
        store.set_state(|s| s.count = 2);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn explicit_unsubscribe_only_removes_its_listener() {
        let store = Store::new("sample", Sample::default());
        let (first_hits, first) = counter(&store);
        let (second_hits, _second) = counter(&store);

        first.unsubscribe();
        store.set_state(|s| s.count = 1);

        assert_eq!(first_hits.load(Ordering::SeqCst), 0);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscription_outliving_store_is_harmless() {
        let store = Store::new("sample", Sample::default());
        let (_hits, sub) = counter(&store);
        drop(store);
        drop(sub);
    }

    #[test]
    fn reset_restores_initial_and_is_idempotent() {
        let initial = Sample {
            label: "seed".into(),
            items: vec![1],
            count: 0,
        };
        let store = Store::new("sample", initial.clone());
        store.set_state(|s| {
            s.label = "changed".into();
            s.items.push(2);
        });

        store.reset();
        assert_eq!(*store.get_state(), initial);
        store.reset();
        assert_eq!(*store.get_state(), initial);
    }

    #[test]
    fn concurrent_writers_each_publish_once() {
        let store = Arc::new(Store::new("sample", Sample::default()));
        let (hits, _sub) = counter(&store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.set_state(|s| s.count += 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_state().count, 400);
        assert_eq!(hits.load(Ordering::SeqCst), 400);
        assert_eq!(store.version(), 400);
    }
}
