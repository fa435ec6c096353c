// ── Loadable resource plumbing ──
//
// The loading/error half of every domain store. Domain stores wrap a
// `ResourceStore<P>` and add setters for their own payload `P`.

use std::sync::Arc;

use serde::Serialize;

use super::observable::{Store, Subscription};
use crate::stream::StoreStream;

/// A payload plus its fetch state.
///
/// `is_loading` and `error` are independent of `data` and of each other;
/// only [`ResourceStore::reset`] clears all three together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Loadable<P> {
    pub data: P,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<P> Loadable<P> {
    pub fn new(data: P) -> Self {
        Self {
            data,
            is_loading: false,
            error: None,
        }
    }
}

/// The loading/error half of a store, as driven by request orchestration.
pub trait FetchTracking: Send + Sync {
    fn store_name(&self) -> &'static str;
    fn set_loading(&self, is_loading: bool);
    fn set_error(&self, error: Option<String>);
    fn has_error(&self) -> bool;
}

/// A [`Store`] of [`Loadable<P>`] with the shared loading/error setters.
pub struct ResourceStore<P: Clone + Send + Sync + 'static> {
    inner: Store<Loadable<P>>,
}

impl<P: Clone + Send + Sync + 'static> ResourceStore<P> {
    pub fn new(name: &'static str, initial: Loadable<P>) -> Self {
        Self {
            inner: Store::new(name, initial),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub fn get_state(&self) -> Arc<Loadable<P>> {
        self.inner.get_state()
    }

    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.inner.set_state(|s| s.is_loading = is_loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.inner.set_state(|s| s.error = error);
    }

    /// Apply a partial update to the payload only.
    pub fn set_data(&self, update: impl FnOnce(&mut P)) {
        self.inner.set_state(|s| update(&mut s.data));
    }

    pub fn reset(&self) {
        self.inner.reset();
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Loadable<P>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(listener)
    }

    pub fn watch(&self) -> StoreStream<Loadable<P>> {
        self.inner.watch()
    }
}

impl<P: Clone + Send + Sync + 'static> FetchTracking for ResourceStore<P> {
    fn store_name(&self) -> &'static str {
        self.name()
    }

    fn set_loading(&self, is_loading: bool) {
        ResourceStore::set_loading(self, is_loading);
    }

    fn set_error(&self, error: Option<String>) {
        ResourceStore::set_error(self, error);
    }

    fn has_error(&self) -> bool {
        self.get_state().error.is_some()
    }
}
