// ── Event / statistics query store ──
//
// Holds the last filter submitted and the last page and statistics
// received. Nothing accumulates across fetches: a page change replaces
// the previous page outright.

use std::sync::Arc;

use serde::Serialize;

use dxwatch_api::{EventFilter, EventResponse, EventStatistics};

use super::observable::Subscription;
use super::resource::{FetchTracking, Loadable, ResourceStore};
use crate::stream::StoreStream;

pub const EVENTS_STORE_NAME: &str = "events-store";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventsState {
    pub filter: Option<EventFilter>,
    pub events: Option<Arc<EventResponse>>,
    pub statistics: Option<Arc<EventStatistics>>,
}

pub struct EventStore {
    inner: ResourceStore<EventsState>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::with_initial(Loadable::default())
    }

    pub fn with_initial(initial: Loadable<EventsState>) -> Self {
        Self {
            inner: ResourceStore::new(EVENTS_STORE_NAME, initial),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub fn get_state(&self) -> Arc<Loadable<EventsState>> {
        self.inner.get_state()
    }

    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    /// The filter most recently submitted, if any.
    pub fn filter(&self) -> Option<EventFilter> {
        self.inner.get_state().data.filter.clone()
    }

    pub fn set_filter(&self, filter: Option<EventFilter>) {
        self.inner.set_data(|d| d.filter = filter);
    }

    /// Replace the held page. Earlier pages are discarded.
    pub fn set_events(&self, events: Option<EventResponse>) {
        self.inner.set_data(|d| d.events = events.map(Arc::new));
    }

    pub fn set_statistics(&self, statistics: Option<EventStatistics>) {
        self.inner.set_data(|d| d.statistics = statistics.map(Arc::new));
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
        listener: impl Fn(&Loadable<EventsState>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(listener)
    }

    pub fn watch(&self) -> StoreStream<Loadable<EventsState>> {
        self.inner.watch()
    }
}

impl FetchTracking for EventStore {
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

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dxwatch_api::Pagination;

    use super::*;

    fn page(n: u32, ids: &[&str]) -> EventResponse {
        let data = ids
            .iter()
            .map(|id| {
                serde_json::from_value(serde_json::json!({
                    "id": id,
                    "timestamp": "2024-01-01T00:00:00Z",
                    "type": "motion"
                }))
                .unwrap()
            })
            .collect();
        EventResponse {
            data,
            pagination: Pagination {
                page: n,
                page_size: 2,
                total: 4,
                total_pages: 2,
            },
        }
    }

    #[test]
    fn page_change_replaces_previous_page() {
        let store = EventStore::new();
        store.set_events(Some(page(1, &["a", "b"])));
        store.set_events(Some(page(2, &["c", "d"])));

        let snap = store.get_state();
        let events = snap.data.events.as_ref().unwrap();
        let ids: Vec<&str> = events.data.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
        assert_eq!(events.pagination.page, 2);
    }

    #[test]
    fn filter_and_statistics_are_independent_fields() {
        let store = EventStore::new();
        let filter = EventFilter {
            types: vec!["motion".into()],
            ..EventFilter::default()
        };
        store.set_filter(Some(filter.clone()));
        store.set_statistics(Some(EventStatistics {
            total: 3,
            ..EventStatistics::default()
        }));
        store.set_events(Some(page(1, &["a"])));

        let snap = store.get_state();
        assert_eq!(store.filter(), Some(filter));
        assert_eq!(snap.data.statistics.as_ref().unwrap().total, 3);
    }

    #[test]
    fn reset_is_idempotent() {
        let store = EventStore::new();
        store.set_filter(Some(EventFilter::default()));
        store.set_events(Some(page(1, &["a"])));
        store.set_loading(true);

        store.reset();
        let once = store.get_state();
        store.reset();

        assert_eq!(*once, Loadable::default());
        assert_eq!(once, store.get_state());
        assert_eq!(store.name(), "events-store");
    }
}
