// ── Runtime client configuration ──
//
// Describes *where* the backend lives and how to talk to it. Core never
// reads config files: the CLI (via dxwatch-config) builds a
// `ClientConfig` and hands it in.

use std::time::Duration;

use dxwatch_api::{DEFAULT_TIMEOUT_MS, Endpoints, TlsMode, TransportConfig};
use url::Url;

use crate::store::DEFAULT_POLLING_INTERVAL_MS;

/// Configuration for connecting to one monitoring backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root URL (e.g. `http://192.168.1.20:8080`).
    pub base_url: Url,
    /// Resource paths under `/api`.
    pub endpoints: Endpoints,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Initial (and reset) telemetry polling interval, in milliseconds.
    pub polling_interval_ms: u64,
}

impl ClientConfig {
    /// Config for `base_url` with every other setting at its default.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            endpoints: Endpoints::default(),
            tls: TlsMode::default(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
