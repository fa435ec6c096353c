// ── Telemetry store ──
//
// Latest metrics sample, a bounded history of past samples, and the
// polling cadence the external scheduler reads. The store never runs a
// timer itself.

use std::sync::Arc;

use serde::Serialize;

use dxwatch_api::MetricsSnapshot;

use super::history::BoundedHistory;
use super::observable::Subscription;
use super::resource::{FetchTracking, Loadable, ResourceStore};
use crate::stream::StoreStream;

pub const METRICS_STORE_NAME: &str = "metrics-store";

/// Maximum number of samples kept in [`MetricsState::history`].
pub const MAX_HISTORY: usize = 60;

/// Default polling cadence, in milliseconds.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsState {
    pub metrics: Option<MetricsSnapshot>,
    pub history: BoundedHistory<MetricsSnapshot>,
    pub polling_interval: u64,
}

impl Default for MetricsState {
    fn default() -> Self {
        Self {
            metrics: None,
            history: BoundedHistory::new(MAX_HISTORY),
            polling_interval: DEFAULT_POLLING_INTERVAL_MS,
        }
    }
}

/// Store for live telemetry.
pub struct MetricsStore {
    inner: ResourceStore<MetricsState>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::with_initial(Loadable::default())
    }

    pub fn with_initial(initial: Loadable<MetricsState>) -> Self {
        Self {
            inner: ResourceStore::new(METRICS_STORE_NAME, initial),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub fn get_state(&self) -> Arc<Loadable<MetricsState>> {
        self.inner.get_state()
    }

    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    /// Current polling interval in milliseconds.
    pub fn polling_interval(&self) -> u64 {
        self.inner.get_state().data.polling_interval
    }

    /// Replace the current sample. History and polling interval are untouched.
    pub fn set_metrics(&self, metrics: Option<MetricsSnapshot>) {
        self.inner.set_data(|d| d.metrics = metrics);
    }

    /// Append a sample, evicting the oldest once the history is full.
    pub fn add_to_history(&self, snapshot: MetricsSnapshot) {
        self.inner.set_data(|d| d.history = d.history.appended(snapshot));
    }

    /// Replace the whole history (newest samples win if `samples` is too long).
    pub fn set_history(&self, samples: Vec<MetricsSnapshot>) {
        self.inner.set_data(|d| {
            d.history = BoundedHistory::from_items(d.history.capacity(), samples);
        });
    }

    /// Store `ms` verbatim. No clamping; enforcement belongs to the scheduler.
    pub fn set_polling_interval(&self, ms: u64) {
        self.inner.set_data(|d| d.polling_interval = ms);
    }

    /// Empty the history. The current sample and polling interval stay.
    pub fn clear_history(&self) {
        self.inner.set_data(|d| d.history = d.history.cleared());
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.inner.set_loading(is_loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.inner.set_error(error);
    }

    pub fn reset(&self) {
        self.inner.reset();
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Loadable<MetricsState>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(listener)
    }

    pub fn watch(&self) -> StoreStream<Loadable<MetricsState>> {
        self.inner.watch()
    }
}

impl FetchTracking for MetricsStore {
    fn store_name(&self) -> &'static str {
        self.inner.store_name()
    }

    fn set_loading(&self, is_loading: bool) {
        self.inner.set_loading(is_loading);
    }

    fn set_error(&self, error: Option<String>) {
        self.inner.set_error(error);
    }

    fn has_error(&self) -> bool {
        self.inner.has_error()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}
