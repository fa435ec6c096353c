// ── Reactive stores ──
//
// One generic observable container, the loading/error wrapper built on
// it, and the three domain stores. Stores never reference each other.

mod dx;
mod events;
mod history;
mod metrics;
mod observable;
mod resource;

pub use dx::{DX_STORE_NAME, DxState, DxStore};
pub use events::{EVENTS_STORE_NAME, EventStore, EventsState};
pub use history::BoundedHistory;
pub use metrics::{
    DEFAULT_POLLING_INTERVAL_MS, MAX_HISTORY, METRICS_STORE_NAME, MetricsState, MetricsStore,
};
pub use observable::{Store, Subscription};
pub use resource::{FetchTracking, Loadable, ResourceStore};

#[cfg(test)]
mod tests {
    use dxwatch_api::MetricsSnapshot;

    use super::*;

    #[test]
    fn stores_do_not_leak_into_each_other() {
        let dx = DxStore::new();
        let metrics = MetricsStore::new();
        let events = EventStore::new();

        let dx_before = dx.get_state();
        let events_before = events.get_state();

        metrics.set_metrics(Some(MetricsSnapshot::default()));
        metrics.add_to_history(MetricsSnapshot::default());
        metrics.set_error(Some("metrics down".into()));
        metrics.reset();

        assert_eq!(dx.get_state(), dx_before);
        assert_eq!(dx.version(), 0);
        assert_eq!(events.get_state(), events_before);

        let metrics_before = metrics.get_state();
        let metrics_version = metrics.version();
        dx.set_loading(true);
        dx.set_error(Some("dx down".into()));
        dx.reset();
        events.set_loading(true);

        assert_eq!(metrics.get_state(), metrics_before);
        assert_eq!(metrics.version(), metrics_version);
    }
}
