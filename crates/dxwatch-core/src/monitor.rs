// ── Monitor: the composition root ──
//
// Owns the Gateway and one instance of each store, and drives the
// loading/error discipline around every Gateway call. Stores stay
// passive; everything that awaits lives here.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use tracing::{debug, warn};

use dxwatch_api::{
    ApiClient, Device, DeviceStatus, DeviceUpdate, EventFilter, EventResponse, EventStatistics,
    ExportFormat, License, MetricsSnapshot, TimeRange,
};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::sequence::{Applied, RequestSequencer};
use crate::store::{DxStore, EventStore, FetchTracking, Loadable, MetricsState, MetricsStore};

/// One sequencer per logical operation, so unrelated requests against the
/// same store never invalidate each other.
#[derive(Debug, Default)]
struct Sequencers {
    device: RequestSequencer,
    status: RequestSequencer,
    license: RequestSequencer,
    metrics: RequestSequencer,
    metrics_history: RequestSequencer,
    events: RequestSequencer,
    statistics: RequestSequencer,
}

/// Requests currently awaiting the Gateway, per store. Operations that
/// share a store overlap (`refresh_all`), so only the last one to finish
/// may clear `is_loading`.
#[derive(Debug, Default)]
struct InFlight {
    dx: AtomicUsize,
    metrics: AtomicUsize,
    events: AtomicUsize,
}

/// A store paired with its in-flight counter.
struct Slot<'a, S: ?Sized> {
    store: &'a S,
    in_flight: &'a AtomicUsize,
}

/// Client facade: Gateway + stores + request orchestration.
///
/// Every fetch follows the same sequence: `set_loading(true)` and clear the
/// previous error, await the Gateway, then either the data setter or
/// `set_error`, and finally `set_loading(false)` once no other request on
/// that store is in flight. A response superseded by a newer request for
/// the same operation is dropped before it touches the store's data.
pub struct Monitor {
    api: Arc<ApiClient>,
    dx: Arc<DxStore>,
    metrics: Arc<MetricsStore>,
    events: Arc<EventStore>,
    seq: Sequencers,
    in_flight: InFlight,
}

impl Monitor {
    /// Build the Gateway from `config` and fresh stores.
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let api = ApiClient::new(
            config.base_url.as_str(),
            config.endpoints.clone(),
            &config.transport(),
        )?;

        let metrics = MetricsStore::with_initial(Loadable::new(MetricsState {
            polling_interval: config.polling_interval_ms,
            ..MetricsState::default()
        }));

        Ok(Self::from_parts(
            Arc::new(api),
            Arc::new(DxStore::new()),
            Arc::new(metrics),
            Arc::new(EventStore::new()),
        ))
    }

    /// Assemble from pre-built parts (tests, embedding applications).
    pub fn from_parts(
        api: Arc<ApiClient>,
        dx: Arc<DxStore>,
        metrics: Arc<MetricsStore>,
        events: Arc<EventStore>,
    ) -> Self {
        Self {
            api,
            dx,
            metrics,
            events,
            seq: Sequencers::default(),
            in_flight: InFlight::default(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn dx_store(&self) -> &Arc<DxStore> {
        &self.dx
    }

    pub fn metrics_store(&self) -> &Arc<MetricsStore> {
        &self.metrics
    }

    pub fn event_store(&self) -> &Arc<EventStore> {
        &self.events
    }

    /// Return every store to its initial snapshot (logout / teardown).
    pub fn reset_all(&self) {
        self.dx.reset();
        self.metrics.reset();
        self.events.reset();
    }

    fn dx_slot(&self) -> Slot<'_, DxStore> {
        Slot {
            store: &self.dx,
            in_flight: &self.in_flight.dx,
        }
    }

    fn metrics_slot(&self) -> Slot<'_, MetricsStore> {
        Slot {
            store: &self.metrics,
            in_flight: &self.in_flight.metrics,
        }
    }

    fn events_slot(&self) -> Slot<'_, EventStore> {
        Slot {
            store: &self.events,
            in_flight: &self.in_flight.events,
        }
    }

    // ── Device & license ─────────────────────────────────────────────

    pub async fn refresh_device(&self) -> Result<Applied<Device>, CoreError> {
        let dx = &self.dx;
        track(
            self.dx_slot(),
            &self.seq.device,
            "device",
            self.api.get_device(),
            |device| dx.set_dx(Some(device.clone())),
        )
        .await
    }

    pub async fn refresh_status(&self) -> Result<Applied<DeviceStatus>, CoreError> {
        let dx = &self.dx;
        track(
            self.dx_slot(),
            &self.seq.status,
            "status",
            self.api.get_status(),
            |status| dx.set_status(Some(status.clone())),
        )
        .await
    }

    pub async fn update_device(&self, update: &DeviceUpdate) -> Result<Applied<Device>, CoreError> {
        let dx = &self.dx;
        track(
            self.dx_slot(),
            &self.seq.device,
            "update_device",
            self.api.update_device(update),
            |device| dx.set_dx(Some(device.clone())),
        )
        .await
    }

    /// Ask the device to restart. Nothing is stored; status is re-read on
    /// the next refresh.
    pub async fn restart_device(&self) -> Result<(), CoreError> {
        let restart = RequestSequencer::new();
        track(self.dx_slot(), &restart, "restart", self.api.restart_device(), |_| {})
            .await
            .map(|_| ())
    }

    pub async fn refresh_license(&self) -> Result<Applied<License>, CoreError> {
        let dx = &self.dx;
        track(
            self.dx_slot(),
            &self.seq.license,
            "license",
            self.api.get_license(),
            |license| dx.set_license(Some(license.clone())),
        )
        .await
    }

    pub async fn activate_license(&self, key: &str) -> Result<Applied<License>, CoreError> {
        let dx = &self.dx;
        track(
            self.dx_slot(),
            &self.seq.license,
            "activate_license",
            self.api.activate_license(key),
            |license| dx.set_license(Some(license.clone())),
        )
        .await
    }

    /// Deactivate, then re-read the license so the store reflects the
    /// backend's view rather than a guess.
    pub async fn deactivate_license(&self) -> Result<Applied<License>, CoreError> {
        let dx = &self.dx;
        let deactivated = track(
            self.dx_slot(),
            &self.seq.license,
            "deactivate_license",
            self.api.deactivate_license(),
            |_| {},
        )
        .await?;
        if deactivated.is_stale() {
            return Ok(Applied::Stale);
        }
        self.refresh_license().await
    }

    /// Device, status, and license concurrently. Returns the first error.
    pub async fn refresh_all(&self) -> Result<(), CoreError> {
        let (device, status, license) = tokio::join!(
            self.refresh_device(),
            self.refresh_status(),
            self.refresh_license()
        );
        device?;
        status?;
        license?;
        Ok(())
    }

    // ── Telemetry ────────────────────────────────────────────────────

    /// One polling tick: fetch the latest sample, make it current, and
    /// append it to history.
    pub async fn poll_metrics_once(&self) -> Result<Applied<MetricsSnapshot>, CoreError> {
        let metrics = &self.metrics;
        track(
            self.metrics_slot(),
            &self.seq.metrics,
            "metrics",
            self.api.get_metrics(TimeRange::default()),
            |sample| {
                metrics.set_metrics(Some(*sample));
                metrics.add_to_history(*sample);
            },
        )
        .await
    }

    /// Replace history with the backend's samples for `range`.
    pub async fn load_metrics_history(
        &self,
        range: TimeRange,
    ) -> Result<Applied<Vec<MetricsSnapshot>>, CoreError> {
        let metrics = &self.metrics;
        track(
            self.metrics_slot(),
            &self.seq.metrics_history,
            "metrics_history",
            self.api.get_metrics_history(range),
            |samples| metrics.set_history(samples.clone()),
        )
        .await
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Record `filter` and replace the held page with its results.
    pub async fn search_events(
        &self,
        filter: EventFilter,
    ) -> Result<Applied<EventResponse>, CoreError> {
        let events = &self.events;
        events.set_filter(Some(filter.clone()));
        track(
            self.events_slot(),
            &self.seq.events,
            "events",
            self.api.list_events(&filter),
            |page| events.set_events(Some(page.clone())),
        )
        .await
    }

    /// Re-issue the last submitted filter for another page.
    pub async fn go_to_page(&self, page: u32) -> Result<Applied<EventResponse>, CoreError> {
        let filter = self.events.filter().unwrap_or_default().with_page(page);
        self.search_events(filter).await
    }

    pub async fn load_statistics(
        &self,
        filter: &EventFilter,
    ) -> Result<Applied<EventStatistics>, CoreError> {
        let events = &self.events;
        track(
            self.events_slot(),
            &self.seq.statistics,
            "statistics",
            self.api.event_statistics(filter),
            |stats| events.set_statistics(Some(stats.clone())),
        )
        .await
    }

    /// Pass-through export. The bytes go straight to the caller; no store
    /// is touched.
    pub async fn export_events(
        &self,
        filter: &EventFilter,
        format: ExportFormat,
    ) -> Result<Bytes, CoreError> {
        debug!(%format, "exporting events");
        Ok(self.api.export_events(filter, format).await?)
    }
}

/// Holds a store's loading flag for one request.
///
/// Dropping the guard, on completion or when the request future itself is
/// dropped mid-await, releases the request; the last release on a store
/// clears `is_loading`.
struct LoadingGuard<'a, S: FetchTracking + ?Sized> {
    slot: Slot<'a, S>,
}

impl<'a, S: FetchTracking + ?Sized> LoadingGuard<'a, S> {
    /// Start a request: clear any previous error and raise `is_loading`.
    fn begin(slot: Slot<'a, S>) -> Self {
        slot.in_flight.fetch_add(1, Ordering::AcqRel);
        slot.store.set_loading(true);
        if slot.store.has_error() {
            slot.store.set_error(None);
        }
        Self { slot }
    }
}

impl<S: FetchTracking + ?Sized> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        if self.slot.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.slot.store.set_loading(false);
        }
    }
}

/// Run one Gateway request under the loading/error discipline.
///
/// The error is cleared when the request starts, never on success, so a
/// failure recorded by an overlapping request on the same store survives.
/// `apply` is called only for a fresh success, before loading is released,
/// so readers never observe `is_loading == false` with stale data.
async fn track<S, T, F>(
    slot: Slot<'_, S>,
    sequencer: &RequestSequencer,
    op: &'static str,
    request: F,
    apply: impl FnOnce(&T),
) -> Result<Applied<T>, CoreError>
where
    S: FetchTracking + ?Sized,
    F: Future<Output = Result<T, dxwatch_api::Error>>,
{
    let store = slot.store;
    let ticket = sequencer.begin();
    let _loading = LoadingGuard::begin(slot);

    let result = request.await;

    if !sequencer.is_current(ticket) {
        warn!(store = store.store_name(), op, "dropping stale response");
        return Ok(Applied::Stale);
    }

    match result {
        Ok(value) => {
            apply(&value);
            debug!(store = store.store_name(), op, "request applied");
            Ok(Applied::Fresh(value))
        }
        Err(err) => {
            let err = CoreError::from(err);
            warn!(store = store.store_name(), op, error = %err, "request failed");
            store.set_error(Some(err.to_string()));
            Err(err)
        }
    }
}
