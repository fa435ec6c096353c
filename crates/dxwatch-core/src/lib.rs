// dxwatch-core: Reactive state layer between dxwatch-api and consumers (CLI, dashboards).

pub mod config;
pub mod error;
pub mod monitor;
pub mod poller;
pub mod sequence;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ClientConfig;
pub use error::CoreError;
pub use monitor::Monitor;
pub use poller::MetricsPoller;
pub use sequence::{Applied, RequestSequencer, Ticket};
pub use store::{
    BoundedHistory, DEFAULT_POLLING_INTERVAL_MS, DxState, DxStore, EventStore, EventsState,
    FetchTracking, Loadable, MAX_HISTORY, MetricsState, MetricsStore, ResourceStore, Store,
    Subscription,
};
pub use stream::StoreStream;

// Wire models pass straight through; consumers rarely need dxwatch-api directly.
pub use dxwatch_api::{
    DEFAULT_TIMEOUT_MS, Device, DeviceState, DeviceStatus, DeviceUpdate, Endpoints, Event, EventFilter,
    EventResponse, EventStatistics, ExportFormat, License, LicenseStatus, MetricsSnapshot,
    Pagination, TimeRange, TlsMode,
};
