// Integration tests for `Monitor` and `MetricsPoller` against a wiremock backend.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dxwatch_core::{
    Applied, ClientConfig, CoreError, DeviceUpdate, EventFilter, ExportFormat, MAX_HISTORY,
    MetricsPoller, Monitor,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Monitor) {
    let server = MockServer::start().await;
    let config = ClientConfig::new(server.uri().parse().unwrap());
    let monitor = Monitor::new(&config).unwrap();
    (server, monitor)
}

fn metrics_body(uptime: u64) -> Value {
    json!({
        "cpuPercent": 12.5,
        "cpuCount": 4,
        "memoryTotal": 8_000,
        "memoryUsed": 2_000,
        "memoryPercent": 25.0,
        "diskTotal": 100_000,
        "diskUsed": 40_000,
        "diskPercent": 40.0,
        "uptime": uptime
    })
}

fn events_page(page: u32, ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "timestamp": "2024-05-01T12:00:00Z", "type": "motion" }))
        .collect();
    json!({
        "data": data,
        "pagination": { "page": page, "pageSize": 2, "total": 4, "totalPages": 2 }
    })
}

// ── Loading / error discipline ──────────────────────────────────────

#[tokio::test]
async fn test_success_sets_data_before_clearing_loading() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dx"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "dx-1", "name": "Lobby" })),
        )
        .mount(&server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let _sub = monitor.dx_store().subscribe(move |s| {
        log.lock()
            .unwrap()
            .push((s.is_loading, s.data.dx.is_some(), s.error.clone()));
    });

    let device = monitor.refresh_device().await.unwrap().fresh().unwrap();
    assert_eq!(device.name, "Lobby");

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(true, false, None), (true, true, None), (false, true, None)]
    );
}

#[tokio::test]
async fn test_failure_records_error_and_keeps_data() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dx/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "online": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dx/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    monitor.refresh_status().await.unwrap();
    let err = monitor.refresh_status().await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));

    let state = monitor.dx_store().get_state();
    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("API error: boom"));
    assert!(state.data.status.as_ref().unwrap().online);
}

#[tokio::test]
async fn test_success_clears_previous_error() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/license"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/license"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "trial" })))
        .mount(&server)
        .await;

    assert!(monitor.refresh_license().await.is_err());
    assert!(monitor.dx_store().get_state().error.is_some());

    monitor.refresh_license().await.unwrap();
    let state = monitor.dx_store().get_state();
    assert!(state.error.is_none());
    assert!(state.data.license.is_some());
}

#[tokio::test]
async fn test_superseded_response_is_dropped() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dx/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "online": false, "message": "old" }))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dx/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "online": true, "message": "new" })),
        )
        .mount(&server)
        .await;

    let (slow, fast) = tokio::join!(monitor.refresh_status(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        monitor.refresh_status().await
    });

    assert_eq!(slow.unwrap(), Applied::Stale);
    assert!(!fast.unwrap().is_stale());

    let state = monitor.dx_store().get_state();
    let status = state.data.status.as_ref().unwrap();
    assert_eq!(status.message.as_deref(), Some("new"));
    assert!(!state.is_loading);
}

#[tokio::test]
async fn test_refresh_all_keeps_sibling_failure() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dx/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dx"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "dx-1" }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/license"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "active" }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let loading_after_error = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&loading_after_error);
    let _sub = monitor.dx_store().subscribe(move |s| {
        if s.error.is_some() {
            log.lock().unwrap().push(s.is_loading);
        }
    });

    assert!(monitor.refresh_all().await.is_err());

    let state = monitor.dx_store().get_state();
    assert_eq!(state.error.as_deref(), Some("API error: boom"));
    assert!(!state.is_loading);
    assert!(state.data.dx.is_some());
    assert!(state.data.license.is_some());

    // The failed status request finished first; loading stayed up until
    // the slower siblings were done.
    let seen = loading_after_error.lock().unwrap();
    assert_eq!(seen.first(), Some(&true));
    assert_eq!(seen.last(), Some(&false));
    assert_eq!(seen.iter().filter(|loading| !**loading).count(), 1);
}

#[tokio::test]
async fn test_dropped_request_releases_loading() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/license"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "active" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), monitor.refresh_license()).await;
    assert!(abandoned.is_err());

    let state = monitor.dx_store().get_state();
    assert!(!state.is_loading);
    assert!(state.data.license.is_none());
    assert!(state.error.is_none());
}

// ── Device & license ────────────────────────────────────────────────

#[tokio::test]
async fn test_update_device_replaces_stored_device() {
    let (server, monitor) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/dx"))
        .and(body_json(json!({ "location": "Dock 3" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "dx-1", "name": "Lobby", "location": "Dock 3"
        })))
        .mount(&server)
        .await;

    let update = DeviceUpdate {
        location: Some("Dock 3".into()),
        ..DeviceUpdate::default()
    };
    monitor.update_device(&update).await.unwrap();

    let state = monitor.dx_store().get_state();
    assert_eq!(
        state.data.dx.as_ref().unwrap().location.as_deref(),
        Some("Dock 3")
    );
}

#[tokio::test]
async fn test_rejected_activation_leaves_license_untouched() {
    let (server, monitor) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/license/activate"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid license key" })),
        )
        .mount(&server)
        .await;

    let err = monitor.activate_license("BAD").await.unwrap_err();
    assert!(matches!(err, CoreError::Rejected { status: 400, .. }));

    let state = monitor.dx_store().get_state();
    assert!(state.data.license.is_none());
    assert_eq!(
        state.error.as_deref(),
        Some("Request rejected by backend: invalid license key")
    );
}

#[tokio::test]
async fn test_deactivate_refetches_license() {
    let (server, monitor) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/license/deactivate"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/license"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "inactive" })))
        .expect(1)
        .mount(&server)
        .await;

    let license = monitor.deactivate_license().await.unwrap().fresh().unwrap();
    assert_eq!(license.status.to_string(), "inactive");
    assert!(monitor.dx_store().get_state().data.license.is_some());
}

#[tokio::test]
async fn test_refresh_all_fills_every_field() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "dx-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dx/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "running" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/license"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "active" })))
        .mount(&server)
        .await;

    monitor.refresh_all().await.unwrap();

    let state = monitor.dx_store().get_state();
    assert!(state.data.dx.is_some());
    assert!(state.data.status.is_some());
    assert!(state.data.license.is_some());
    assert!(!state.is_loading);
}

// ── Telemetry ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_poll_sets_current_and_appends_history() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metrics_body(42)))
        .mount(&server)
        .await;

    monitor.poll_metrics_once().await.unwrap();
    monitor.poll_metrics_once().await.unwrap();

    let state = monitor.metrics_store().get_state();
    assert_eq!(state.data.metrics.unwrap().uptime, 42);
    assert_eq!(state.data.history.len(), 2);
}

#[tokio::test]
async fn test_history_load_is_truncated_to_max() {
    let (server, monitor) = setup().await;

    let samples: Vec<Value> = (0..80).map(metrics_body).collect();
    Mock::given(method("GET"))
        .and(path("/api/metrics/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(samples))
        .mount(&server)
        .await;

    monitor
        .load_metrics_history(dxwatch_core::TimeRange::default())
        .await
        .unwrap();

    let state = monitor.metrics_store().get_state();
    assert_eq!(state.data.history.len(), MAX_HISTORY);
    assert_eq!(state.data.history.first().unwrap().uptime, 20);
}

#[tokio::test]
async fn test_configured_interval_seeds_store() {
    let server = MockServer::start().await;
    let mut config = ClientConfig::new(server.uri().parse().unwrap());
    config.polling_interval_ms = 2_500;
    let monitor = Monitor::new(&config).unwrap();

    assert_eq!(monitor.metrics_store().polling_interval(), 2_500);
    monitor.metrics_store().set_polling_interval(7_000);
    monitor.reset_all();
    assert_eq!(monitor.metrics_store().polling_interval(), 2_500);
}

#[tokio::test]
async fn test_poller_fills_history_until_stopped() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metrics_body(1)))
        .mount(&server)
        .await;

    monitor.metrics_store().set_polling_interval(10);
    let monitor = Arc::new(monitor);
    let mut watch = monitor.metrics_store().watch();

    let poller = MetricsPoller::spawn(Arc::clone(&monitor), CancellationToken::new());

    tokio::time::timeout(Duration::from_secs(5), async {
        while watch.latest().data.history.len() < 3 {
            watch.changed().await;
        }
    })
    .await
    .unwrap();

    assert!(poller.is_running());
    poller.stop().await;

    let len = monitor.metrics_store().get_state().data.history.len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(monitor.metrics_store().get_state().data.history.len(), len);
}

#[tokio::test]
async fn test_poller_survives_failed_ticks() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/metrics"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metrics_body(9)))
        .mount(&server)
        .await;

    monitor.metrics_store().set_polling_interval(0);
    let monitor = Arc::new(monitor);
    let cancel = CancellationToken::new();
    let poller = MetricsPoller::spawn(Arc::clone(&monitor), cancel.clone());

    let mut watch = monitor.metrics_store().watch();
    tokio::time::timeout(Duration::from_secs(5), async {
        while watch.latest().data.metrics.is_none() {
            watch.changed().await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    poller.stop().await;
    assert_eq!(monitor.metrics_store().polling_interval(), 0);
}

#[tokio::test]
async fn test_stopping_poller_mid_request_releases_loading() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/metrics"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(metrics_body(3))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let monitor = Arc::new(monitor);
    let poller = MetricsPoller::spawn(Arc::clone(&monitor), CancellationToken::new());

    let mut watch = monitor.metrics_store().watch();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !watch.latest().is_loading {
            watch.changed().await;
        }
    })
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    poller.stop().await;

    let state = monitor.metrics_store().get_state();
    assert!(!state.is_loading);
    assert!(state.data.metrics.is_none());
    assert!(state.data.history.is_empty());
}

// ── Events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_then_page_replaces_results() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param("types", "motion"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(events_page(1, &["a", "b"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param("types", "motion"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(events_page(2, &["c", "d"])))
        .mount(&server)
        .await;

    let filter = EventFilter {
        types: vec!["motion".into()],
        page: Some(1),
        ..EventFilter::default()
    };
    monitor.search_events(filter).await.unwrap();
    monitor.go_to_page(2).await.unwrap();

    let state = monitor.event_store().get_state();
    let events = state.data.events.as_ref().unwrap();
    let ids: Vec<&str> = events.data.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "d"]);
    assert_eq!(state.data.filter.as_ref().unwrap().page, Some(2));
}

#[tokio::test]
async fn test_statistics_are_stored() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/events/statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 7,
            "byType": { "motion": 5, "person": 2 }
        })))
        .mount(&server)
        .await;

    monitor
        .load_statistics(&EventFilter::default())
        .await
        .unwrap();

    let state = monitor.event_store().get_state();
    let stats = state.data.statistics.as_ref().unwrap();
    assert_eq!(stats.total, 7);
    assert_eq!(stats.by_type["person"], 2);
}

#[tokio::test]
async fn test_export_does_not_touch_store() {
    let (server, monitor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/events/export"))
        .and(query_param("format", "csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id,type\na,motion\n".to_vec()))
        .mount(&server)
        .await;

    let before = monitor.event_store().version();
    let bytes = monitor
        .export_events(&EventFilter::default(), ExportFormat::Csv)
        .await
        .unwrap();

    assert_eq!(&bytes[..], b"id,type\na,motion\n");
    assert_eq!(monitor.event_store().version(), before);
}
