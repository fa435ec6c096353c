// Endpoint path configuration.
//
// Each resource is addressed by a single path segment under the API base
// path; sub-resources (`/status`, `/restart`, ...) hang off these.

use serde::{Deserialize, Serialize};

/// Base path every endpoint is resolved against.
pub const API_BASE_PATH: &str = "/api";

/// Resource paths relative to [`API_BASE_PATH`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub dx: String,
    pub license: String,
    pub metrics: String,
    pub events: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            dx: "dx".into(),
            license: "license".into(),
            metrics: "metrics".into(),
            events: "events".into(),
        }
    }
}

impl Endpoints {
    pub(crate) fn dx_path(&self, sub: Option<&str>) -> String {
        join(&self.dx, sub)
    }

    pub(crate) fn license_path(&self, sub: Option<&str>) -> String {
        join(&self.license, sub)
    }

    pub(crate) fn metrics_path(&self, sub: Option<&str>) -> String {
        join(&self.metrics, sub)
    }

    pub(crate) fn events_path(&self, sub: Option<&str>) -> String {
        join(&self.events, sub)
    }
}

fn join(resource: &str, sub: Option<&str>) -> String {
    let resource = resource.trim_matches('/');
    match sub {
        Some(sub) => format!("{resource}/{}", sub.trim_matches('/')),
        None => resource.to_owned(),
    }
}
