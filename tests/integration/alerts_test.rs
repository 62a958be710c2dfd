#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crowdwatch::application::config::AppConfig;
use crowdwatch::application::services::{AlertFilter, Dashboard};
use crowdwatch::domain::entities::{CountingAlerts, StreamAlertType, StreamAlerts};
use crowdwatch::domain::ports::backend::{ErrorKind, FetchError};
use crowdwatch::domain::value_objects::SourceId;
use crowdwatch::infrastructure::backend::in_memory::{Endpoint, InMemoryBackend};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn load_fixture<T: DeserializeOwned>(name: &str) -> T {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let json = std::fs::read_to_string(&path).expect("Failed to read fixture");
    serde_json::from_str(&json).expect("Failed to parse fixture")
}

fn seeded_backend() -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new());
    let alerts: CountingAlerts = load_fixture("counting_alerts.json");
    backend.set_alerts(alerts.alerts);
    backend
}

fn ids(dashboard: &Dashboard) -> Vec<String> {
    dashboard
        .alerts()
        .alerts()
        .into_iter()
        .map(|a| a.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Acknowledge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_acknowledge_changes_nothing() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());
    let coordinator = dashboard.alerts();
    coordinator
        .refresh(AlertFilter::default())
        .await
        .expect("refresh");
    coordinator.set_selection(["a1", "a2"]);

    backend.set_acknowledge_error(Some(FetchError::Network("connection refused".into())));
    let err = coordinator
        .acknowledge_selected()
        .await
        .expect_err("acknowledge must fail");

    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(coordinator.selected(), vec!["a1".to_string(), "a2".to_string()]);
    assert_eq!(ids(&dashboard), vec!["a1", "a2", "a3"]);
    assert_eq!(coordinator.unacknowledged_count(), 2);
    // The failed call did not trigger a re-fetch.
    assert_eq!(backend.calls(Endpoint::CountingAlerts), 1);
}

#[tokio::test]
async fn successful_acknowledge_clears_selection_and_refetches() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());
    let coordinator = dashboard.alerts();
    coordinator
        .refresh(AlertFilter::default())
        .await
        .expect("refresh");
    coordinator.set_selection(["a1"]);

    let acknowledged = coordinator.acknowledge_selected().await.expect("ack");

    assert_eq!(acknowledged, 1);
    assert!(coordinator.selected().is_empty());
    assert_eq!(backend.calls(Endpoint::Acknowledge), 1);
    assert_eq!(backend.calls(Endpoint::CountingAlerts), 2);
    let open: Vec<String> = coordinator
        .alerts()
        .into_iter()
        .filter(|a| !a.acknowledged)
        .map(|a| a.id)
        .collect();
    assert_eq!(open, vec!["a2"]);
}

#[tokio::test]
async fn acknowledge_all_ignores_view_filter() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());
    let coordinator = dashboard.alerts();
    coordinator
        .refresh(AlertFilter {
            unacknowledged_only: true,
        })
        .await
        .expect("refresh");
    assert_eq!(ids(&dashboard), vec!["a1", "a2"]);

    let acknowledged = coordinator.acknowledge(None).await.expect("ack");

    assert_eq!(acknowledged, 2);
    assert_eq!(backend.last_acknowledged(), Some(None));
    // Refetched with the unacknowledged filter still applied.
    assert!(coordinator.alerts().is_empty());
}

#[tokio::test]
async fn empty_selection_is_a_no_op() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());

    let acknowledged = dashboard
        .alerts()
        .acknowledge_selected()
        .await
        .expect("no-op");

    assert_eq!(acknowledged, 0);
    assert_eq!(backend.calls(Endpoint::Acknowledge), 0);
    assert!(backend.last_acknowledged().is_none());
}

#[tokio::test]
async fn refetch_failure_after_ack_is_not_an_error() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());
    let coordinator = dashboard.alerts();
    coordinator
        .refresh(AlertFilter::default())
        .await
        .expect("refresh");

    backend.set_alerts_error(Some(FetchError::Server {
        status: 502,
        message: "bad gateway".into(),
    }));
    let acknowledged = coordinator
        .acknowledge(Some(vec!["a2".into()]))
        .await
        .expect("ack succeeds");

    assert_eq!(acknowledged, 1);
    // The list keeps its last-known-good data and records the refresh error.
    let meta = dashboard.meta(SourceId::CountingAlerts);
    assert!(meta.stale);
    assert_eq!(meta.error_kind, Some(ErrorKind::ServerError));
    assert_eq!(ids(&dashboard), vec!["a1", "a2", "a3"]);
}

// ---------------------------------------------------------------------------
// Explicit writes against the polling loop
// ---------------------------------------------------------------------------

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn open_ids(dashboard: &Dashboard) -> Vec<String> {
    dashboard
        .alerts()
        .alerts()
        .into_iter()
        .filter(|a| !a.acknowledged)
        .map(|a| a.id)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn poll_in_flight_during_acknowledge_cannot_revert_it() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());

    dashboard.activate(SourceId::CountingAlerts);
    advance(10).await;
    assert_eq!(open_ids(&dashboard), vec!["a1", "a2"]);

    // The 10 s poll reads the list before the acknowledge and answers at 13 s.
    backend.set_delay(Duration::from_secs(3));
    advance(10_490).await;
    assert_eq!(backend.calls(Endpoint::CountingAlerts), 2);
    backend.set_delay(Duration::ZERO);

    let acknowledged = dashboard.alerts().acknowledge(None).await.expect("ack");
    assert_eq!(acknowledged, 2);
    assert!(open_ids(&dashboard).is_empty());

    advance(3000).await;
    assert!(open_ids(&dashboard).is_empty());
    let meta = dashboard.meta(SourceId::CountingAlerts);
    assert!(meta.error.is_none());

    // The loop keeps polling after its result was dropped.
    advance(7000).await;
    assert_eq!(backend.calls(Endpoint::CountingAlerts), 4);
    assert!(open_ids(&dashboard).is_empty());
    dashboard.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn filter_change_is_not_undone_by_earlier_poll() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());

    backend.set_delay(Duration::from_secs(2));
    dashboard.activate(SourceId::CountingAlerts);
    advance(10).await;
    backend.set_delay(Duration::ZERO);

    let count = dashboard
        .alerts()
        .refresh(AlertFilter {
            unacknowledged_only: true,
        })
        .await
        .expect("refresh");
    assert_eq!(count, 2);

    // The unfiltered first poll answers after the filtered refresh.
    advance(2500).await;
    assert_eq!(ids(&dashboard), vec!["a1", "a2"]);
    dashboard.shutdown().await;
}

#[tokio::test]
async fn selection_toggles() {
    let backend = seeded_backend();
    let dashboard = Dashboard::new(backend, &AppConfig::default());
    let coordinator = dashboard.alerts();

    assert!(coordinator.toggle("a2"));
    coordinator.select("a1");
    assert_eq!(coordinator.selected(), vec!["a1".to_string(), "a2".to_string()]);
    assert!(!coordinator.toggle("a2"));
    coordinator.deselect("a1");
    assert!(coordinator.selected().is_empty());
}

// ---------------------------------------------------------------------------
// Stream alerts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_alerts_follow_type_filter() {
    let backend = Arc::new(InMemoryBackend::new());
    let alerts: StreamAlerts = serde_json::from_str(
        r#"{"status": "success", "alerts": [
            {"stream_name": "camera_3", "alert_type": "disconnected", "timestamp": "2025-06-01T08:00:00"},
            {"stream_name": "camera_3", "alert_type": "reconnected", "timestamp": "2025-06-01T08:02:00"},
            {"stream_name": "camera_7", "alert_type": "high_latency", "timestamp": "2025-06-01T08:05:00"}
        ]}"#,
    )
    .expect("parse");
    backend.set_stream_alerts(Ok(alerts));
    let mut config = AppConfig::default();
    config.alerts.stream_alert_type = Some(StreamAlertType::Disconnected);
    let dashboard = Dashboard::new(backend, &config);
    let coordinator = dashboard.alerts();

    assert_eq!(coordinator.stream_type(), Some(StreamAlertType::Disconnected));
    dashboard.refresh_once().await;
    assert_eq!(coordinator.stream_alerts().len(), 1);

    assert_eq!(coordinator.refresh_stream(None).await.expect("refresh"), 3);
    assert_eq!(coordinator.stream_type(), None);
    assert_eq!(coordinator.stream_alerts().len(), 3);
}
