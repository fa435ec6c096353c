// ── Wire types for the monitoring backend ──
//
// Shapes are owned by the backend; fields the client doesn't need are
// tolerated via `#[serde(default)]` rather than rejected.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Device ───────────────────────────────────────────────────────────

/// Device identity and configuration (`GET {dx}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    /// Backend-specific settings carried through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub config: serde_json::Map<String, serde_json::Value>,
}

/// Partial device update (`PUT {dx}`). Absent fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.timezone.is_none()
    }
}

/// Runtime status (`GET {dx}/status`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub state: DeviceState,
    /// Seconds since boot.
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub camera_count: u32,
    #[serde(default)]
    pub active_streams: u32,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceState {
    Running,
    Starting,
    Restarting,
    Degraded,
    Stopped,
    #[default]
    #[serde(other)]
    Unknown,
}

// ── License ──────────────────────────────────────────────────────────

/// License record (`GET {license}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub status: LicenseStatus,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub max_cameras: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Trial,
    Expired,
    Inactive,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ActivateRequest<'a> {
    pub key: &'a str,
}

// ── Telemetry ────────────────────────────────────────────────────────

/// One sample of host metrics (`GET {metrics}`).
///
/// Percent fields are in `[0, 100]` as reported by the backend; they are
/// not re-validated client-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsSnapshot {
    pub cpu_percent: f64,
    pub cpu_count: u32,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_percent: f64,
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_percent: f64,
    /// Seconds since boot.
    pub uptime: u64,
}

/// Optional `startTime`/`endTime` bounds for metrics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub(crate) fn to_query(self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start {
            params.push(("startTime", start.to_rfc3339()));
        }
        if let Some(end) = self.end {
            params.push(("endTime", end.to_rfc3339()));
        }
        params
    }
}

// ── Events ───────────────────────────────────────────────────────────

/// Query parameters for event listing, statistics, and export.
///
/// Set-valued fields are sent comma-joined; empty sets and `None`
/// fields are omitted from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub streams: Vec<String>,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl EventFilter {
    /// Copy of this filter pointing at a different page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }

    /// Encode as query-string pairs, in a stable order.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(("startDate", start.to_rfc3339()));
        }
        if let Some(end) = self.end_date {
            params.push(("endDate", end.to_rfc3339()));
        }
        for (key, set) in [
            ("types", &self.types),
            ("streams", &self.streams),
            ("apps", &self.apps),
        ] {
            if !set.is_empty() {
                params.push((key, set.join(",")));
            }
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// One page of events (`GET {events}?{filter}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    pub data: Vec<Event>,
    pub pagination: Pagination,
}

/// Aggregates over the filtered event set (`GET {events}/statistics`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatistics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_stream: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_app: BTreeMap<String, u64>,
    #[serde(default)]
    pub timeline: Vec<TimelineBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
}

/// Binary export format for `GET {events}/export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Conventional file extension (no leading dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}
