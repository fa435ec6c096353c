// Async HTTP client for the monitoring backend (the Gateway).
//
// Base path: /api/
// Every resource path comes from `Endpoints`; this module only knows the
// verbs and response handling.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::endpoints::{API_BASE_PATH, Endpoints};
use crate::error::Error;
use crate::models::{
    ActivateRequest, Device, DeviceStatus, DeviceUpdate, EventFilter, EventResponse,
    EventStatistics, ExportFormat, License, MetricsSnapshot, TimeRange,
};
use crate::transport::TransportConfig;

// ── Error response shape from the backend ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the monitoring backend's JSON API.
///
/// Cheap to share behind an `Arc`; `reqwest::Client` pools connections
/// internally.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    endpoints: Endpoints,
    timeout_ms: u64,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server URL, endpoint paths, and transport config.
    ///
    /// `server` is the backend root (e.g. `http://192.168.1.20:8080`);
    /// the `/api/` base path is appended unless already present.
    pub fn new(
        server: &str,
        endpoints: Endpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(server)?;
        Ok(Self {
            http,
            base_url,
            endpoints,
            timeout_ms: transport.timeout_ms(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages timeouts and TLS).
    pub fn from_reqwest(
        server: &str,
        endpoints: Endpoints,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(server)?;
        Ok(Self {
            http,
            base_url,
            endpoints,
            timeout_ms: crate::transport::DEFAULT_TIMEOUT_MS,
        })
    }

    /// Build the base URL, ending in `/api/` so relative joins work.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with(API_BASE_PATH) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}{API_BASE_PATH}/"));
        }

        Ok(url)
    }

    /// The resolved API base URL (always ends in `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ── Device ───────────────────────────────────────────────────────

    pub async fn get_device(&self) -> Result<Device, Error> {
        self.get(&self.endpoints.dx_path(None), &[]).await
    }

    pub async fn get_status(&self) -> Result<DeviceStatus, Error> {
        self.get(&self.endpoints.dx_path(Some("status")), &[]).await
    }

    pub async fn update_device(&self, update: &DeviceUpdate) -> Result<Device, Error> {
        self.put(&self.endpoints.dx_path(None), update).await
    }

    pub async fn restart_device(&self) -> Result<(), Error> {
        self.post_empty(&self.endpoints.dx_path(Some("restart"))).await
    }

    // ── License ──────────────────────────────────────────────────────

    pub async fn get_license(&self) -> Result<License, Error> {
        self.get(&self.endpoints.license_path(None), &[]).await
    }

    pub async fn activate_license(&self, key: &str) -> Result<License, Error> {
        self.post(
            &self.endpoints.license_path(Some("activate")),
            &ActivateRequest { key },
        )
        .await
    }

    pub async fn deactivate_license(&self) -> Result<(), Error> {
        self.post_empty(&self.endpoints.license_path(Some("deactivate"))).await
    }

    // ── Metrics ──────────────────────────────────────────────────────

    /// Latest metrics sample, optionally bounded by a time range.
    pub async fn get_metrics(&self, range: TimeRange) -> Result<MetricsSnapshot, Error> {
        self.get(&self.endpoints.metrics_path(None), &range.to_query()).await
    }

    /// Stored samples within a time range, oldest first.
    pub async fn get_metrics_history(
        &self,
        range: TimeRange,
    ) -> Result<Vec<MetricsSnapshot>, Error> {
        self.get(
            &self.endpoints.metrics_path(Some("history")),
            &range.to_query(),
        )
        .await
    }

    // ── Events ───────────────────────────────────────────────────────

    pub async fn list_events(&self, filter: &EventFilter) -> Result<EventResponse, Error> {
        self.get(&self.endpoints.events_path(None), &filter.to_query()).await
    }

    pub async fn event_statistics(&self, filter: &EventFilter) -> Result<EventStatistics, Error> {
        self.get(
            &self.endpoints.events_path(Some("statistics")),
            &filter.to_query(),
        )
        .await
    }

    /// Export the filtered event set. The payload is returned untouched.
    pub async fn export_events(
        &self,
        filter: &EventFilter,
        format: ExportFormat,
    ) -> Result<Bytes, Error> {
        let mut params = filter.to_query();
        params.push(("format", format.to_string()));
        self.get_bytes(&self.endpoints.events_path(Some("export")), &params).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_response(resp).await
    }

    async fn get_bytes(&self, path: &str, params: &[(&str, String)]) -> Result<Bytes, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?} (binary)");

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if status.is_success() {
            resp.bytes().await.map_err(|e| self.transport_error(e))
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_response(resp).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::handle_empty(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await.map_err(|e| self.transport_error(e))?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.message.or(err.error))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            Error::Transport(err)
        }
    }
}
