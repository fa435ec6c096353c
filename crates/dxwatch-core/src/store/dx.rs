// ── Device & licensing store ──

use std::sync::Arc;

use serde::Serialize;

use dxwatch_api::{Device, DeviceStatus, License};

use super::observable::Subscription;
use super::resource::{FetchTracking, Loadable, ResourceStore};
use crate::stream::StoreStream;

pub const DX_STORE_NAME: &str = "dx-store";

/// Device identity, runtime status, and license. Each is `None` until its
/// first successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DxState {
    pub dx: Option<Arc<Device>>,
    pub status: Option<Arc<DeviceStatus>>,
    pub license: Option<Arc<License>>,
}

/// Store for the device and its license.
///
/// Setters replace their field wholesale and never validate; the caller
/// owns the `set_loading(true)` → fetch → setter / `set_error` →
/// `set_loading(false)` sequence.
pub struct DxStore {
    inner: ResourceStore<DxState>,
}

impl DxStore {
    pub fn new() -> Self {
        Self::with_initial(Loadable::default())
    }

    pub fn with_initial(initial: Loadable<DxState>) -> Self {
        Self {
            inner: ResourceStore::new(DX_STORE_NAME, initial),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub fn get_state(&self) -> Arc<Loadable<DxState>> {
        self.inner.get_state()
    }

    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    pub fn set_dx(&self, device: Option<Device>) {
        self.inner.set_data(|d| d.dx = device.map(Arc::new));
    }

    pub fn set_status(&self, status: Option<DeviceStatus>) {
        self.inner.set_data(|d| d.status = status.map(Arc::new));
    }

    pub fn set_license(&self, license: Option<License>) {
        self.inner.set_data(|d| d.license = license.map(Arc::new));
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.inner.set_loading(is_loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.inner.set_error(error);
    }

    /// Back to `{dx: None, status: None, license: None, is_loading: false,
    /// error: None}` (or the injected initial snapshot) in one update.
    pub fn reset(&self) {
        self.inner.reset();
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Loadable<DxState>) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.subscribe(listener)
    }

    pub fn watch(&self) -> StoreStream<Loadable<DxState>> {
        self.inner.watch()
    }
}

impl FetchTracking for DxStore {
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

impl Default for DxStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use dxwatch_api::LicenseStatus;

    use super::*;

    fn device(name: &str) -> Device {
        serde_json::from_value(serde_json::json!({ "id": "dx-1", "name": name })).unwrap()
    }

    fn license(status: LicenseStatus) -> License {
        License {
            key: Some("KEY".into()),
            status,
            plan: None,
            max_cameras: None,
            features: Vec::new(),
            activated_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn starts_empty() {
        let store = DxStore::new();
        assert_eq!(*store.get_state(), Loadable::default());
        assert_eq!(store.name(), "dx-store");
    }

    #[test]
    fn setters_replace_only_their_field() {
        let store = DxStore::new();
        store.set_dx(Some(device("front")));
        store.set_license(Some(license(LicenseStatus::Active)));
        store.set_dx(Some(device("rear")));

        let snap = store.get_state();
        assert_eq!(snap.data.dx.as_ref().unwrap().name, "rear");
        assert_eq!(
            snap.data.license.as_ref().unwrap().status,
            LicenseStatus::Active
        );
        assert!(snap.data.status.is_none());
    }

    #[test]
    fn set_none_clears_a_field() {
        let store = DxStore::new();
        store.set_license(Some(license(LicenseStatus::Trial)));
        store.set_license(None);
        assert!(store.get_state().data.license.is_none());
    }

    #[test]
    fn each_setter_notifies_once() {
        let store = DxStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let _sub = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.set_loading(true);
        store.set_dx(Some(device("x")));
        store.set_status(None);
        store.set_license(None);
        store.set_error(Some("e".into()));
        store.set_loading(false);
        store.reset();

        assert_eq!(hits.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn reset_is_idempotent() {
        let store = DxStore::new();
        store.set_dx(Some(device("x")));
        store.set_loading(true);
        store.set_error(Some("e".into()));

        store.reset();
        let once = store.get_state();
        store.reset();
        let twice = store.get_state();

        assert_eq!(*once, Loadable::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn reset_restores_injected_initial_snapshot() {
        let seeded = Loadable::new(DxState {
            dx: Some(Arc::new(device("seed"))),
            ..DxState::default()
        });
        let store = DxStore::with_initial(seeded.clone());
        store.set_dx(None);
        store.reset();
        assert_eq!(*store.get_state(), seeded);
    }
}
