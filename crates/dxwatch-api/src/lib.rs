//! Async Rust client for the dxwatch device monitoring backend.
//!
//! [`ApiClient`] is the Gateway: typed `GET`/`PUT`/`POST` calls against the
//! device, license, metrics, and events endpoints, plus the binary event
//! export. Failures surface as [`Error`] with the HTTP status and message.
//!
//! This crate is deliberately stateless. Holding and observing the fetched
//! data is `dxwatch-core`'s job.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ApiClient;
pub use endpoints::{API_BASE_PATH, Endpoints};
pub use error::Error;
pub use models::{
    Device, DeviceState, DeviceStatus, DeviceUpdate, Event, EventFilter, EventResponse,
    EventStatistics, ExportFormat, License, LicenseStatus, MetricsSnapshot, Pagination,
    TimeRange, TimelineBucket,
};
pub use transport::{DEFAULT_TIMEOUT_MS, TlsMode, TransportConfig};
