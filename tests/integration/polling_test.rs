#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crowdwatch::application::config::AppConfig;
use crowdwatch::application::services::Dashboard;
use crowdwatch::domain::entities::{LatestFrame, ReliabilityStatus};
use crowdwatch::domain::ports::backend::{ErrorKind, FetchError};
use crowdwatch::domain::value_objects::SourceId;
use crowdwatch::infrastructure::backend::in_memory::{Endpoint, InMemoryBackend};

// ---------------------------------------------------------------------------
// Fixture loader
// ---------------------------------------------------------------------------

fn load_fixture<T: DeserializeOwned>(name: &str) -> T {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let json = std::fs::read_to_string(&path).expect("Failed to read fixture");
    serde_json::from_str(&json).expect("Failed to parse fixture")
}

fn frame_with_count(count: f64) -> LatestFrame {
    LatestFrame {
        count,
        ..load_fixture("latest.json")
    }
}

fn dashboard(backend: &Arc<InMemoryBackend>, config: &AppConfig) -> Dashboard {
    Dashboard::new(backend.clone(), config)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ---------------------------------------------------------------------------
// Last-known-good retention
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failure_keeps_last_known_good_data() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_latest(Ok(frame_with_count(120.0)));
    let dashboard = dashboard(&backend, &AppConfig::default());

    dashboard.activate(SourceId::Latest);
    advance(10).await;
    let fresh = dashboard.store().latest().get();
    assert_eq!(fresh.data().map(|f| f.count), Some(120.0));
    assert!(fresh.error().is_none());

    backend.set_latest(Err(FetchError::Network("connection reset".into())));
    advance(1000).await;
    let stale = dashboard.store().latest().get();
    assert_eq!(stale.data().map(|f| f.count), Some(120.0));
    assert_eq!(
        stale.error().map(FetchError::kind),
        Some(ErrorKind::NetworkError)
    );
    assert!(stale.is_stale());
    assert!(!stale.loading);

    backend.set_latest(Ok(frame_with_count(98.0)));
    advance(1000).await;
    let recovered = dashboard.store().latest().get();
    assert_eq!(recovered.data().map(|f| f.count), Some(98.0));
    assert!(recovered.error().is_none());
    assert!(!recovered.is_stale());

    dashboard.shutdown().await;
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn stop_during_in_flight_fetch_freezes_snapshot() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_latest(Ok(frame_with_count(10.0)));
    backend.set_delay(Duration::from_millis(500));
    let dashboard = dashboard(&backend, &AppConfig::default());

    let updates = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&updates);
    let _sub = dashboard
        .store()
        .latest()
        .subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

    dashboard.activate(SourceId::Latest);
    // First fetch settles at 0.5 s, the second starts at 1 s.
    advance(1200).await;
    assert_eq!(backend.calls(Endpoint::Latest), 2);
    assert!(dashboard.scheduler().stop(SourceId::Latest));
    let frozen = updates.load(Ordering::SeqCst);
    let before = dashboard.store().latest().get().last_fetched_at;

    // The aborted fetch would have resolved at 1.5 s.
    backend.set_latest(Ok(frame_with_count(99.0)));
    advance(3000).await;

    assert_eq!(updates.load(Ordering::SeqCst), frozen);
    assert_eq!(backend.calls(Endpoint::Latest), 2);
    let snapshot = dashboard.store().latest().get();
    assert_eq!(snapshot.data().map(|f| f.count), Some(10.0));
    assert_eq!(snapshot.last_fetched_at, before);
    assert!(!dashboard.scheduler().is_running(SourceId::Latest));
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_polls_again() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_latest(Ok(frame_with_count(10.0)));
    let dashboard = dashboard(&backend, &AppConfig::default());

    dashboard.activate(SourceId::Latest);
    advance(10).await;
    dashboard.scheduler().stop(SourceId::Latest);
    advance(5000).await;
    assert_eq!(backend.calls(Endpoint::Latest), 1);

    assert!(dashboard.activate(SourceId::Latest));
    advance(10).await;
    assert_eq!(backend.calls(Endpoint::Latest), 2);
    dashboard.shutdown().await;
}

// ---------------------------------------------------------------------------
// Not found
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn not_found_waits_for_next_interval() {
    let backend = Arc::new(InMemoryBackend::new());
    let dashboard = dashboard(&backend, &AppConfig::default());

    dashboard.activate(SourceId::ReliabilityStatus);
    advance(10).await;

    let snapshot = dashboard.store().reliability_status().get();
    assert!(snapshot.data().is_none());
    assert!(!snapshot.loading);
    assert_eq!(
        snapshot.error().map(FetchError::kind),
        Some(ErrorKind::NotFoundError)
    );
    assert_eq!(
        dashboard.meta(SourceId::ReliabilityStatus).error.as_deref(),
        Some("No data available")
    );

    // No retry before the 5 s interval elapses.
    advance(4900).await;
    assert_eq!(backend.calls(Endpoint::ReliabilityStatus), 1);

    backend.set_reliability(Ok(load_fixture::<ReliabilityStatus>(
        "reliability_status.json",
    )));
    advance(200).await;
    assert_eq!(backend.calls(Endpoint::ReliabilityStatus), 2);
    let snapshot = dashboard.store().reliability_status().get();
    assert!(snapshot.data().is_some());
    assert!(snapshot.error().is_none());

    dashboard.shutdown().await;
}

// ---------------------------------------------------------------------------
// Timeouts and isolation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn slow_backend_times_out_as_network_error() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_latest(Ok(frame_with_count(1.0)));
    backend.set_delay(Duration::from_secs(30));
    let mut config = AppConfig::default();
    config.backend.timeout_secs = 2;
    let dashboard = dashboard(&backend, &config);

    dashboard.activate(SourceId::Latest);
    advance(2100).await;

    let snapshot = dashboard.store().latest().get();
    assert!(matches!(
        snapshot.error(),
        Some(FetchError::Timeout { after_ms: 2000 })
    ));
    assert_eq!(
        snapshot.error().map(FetchError::kind),
        Some(ErrorKind::NetworkError)
    );
    dashboard.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn sources_fail_independently() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_latest(Ok(load_fixture("latest.json")));
    backend.set_algorithm_health(Err(FetchError::Server {
        status: 500,
        message: "boom".into(),
    }));
    let dashboard = dashboard(&backend, &AppConfig::default());

    dashboard.start_all();
    advance(10).await;

    assert!(dashboard.meta(SourceId::Latest).has_data);
    assert_eq!(
        dashboard.meta(SourceId::AlgorithmHealth).error_kind,
        Some(ErrorKind::ServerError)
    );
    assert_eq!(
        dashboard.meta(SourceId::StreamHealth).error_kind,
        Some(ErrorKind::NotFoundError)
    );
    assert_eq!(dashboard.camera_statuses().len(), 5);

    dashboard.shutdown().await;
    assert!(dashboard.scheduler().running().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cadences_are_per_source() {
    let backend = Arc::new(InMemoryBackend::new());
    let mut config = AppConfig::default();
    config.polling.latest_ms = 500;
    config.polling.system_status_ms = 2000;
    let dashboard = dashboard(&backend, &config);

    dashboard.activate(SourceId::Latest);
    dashboard.activate(SourceId::SystemStatus);
    advance(4100).await;

    // Ticks at 0, 0.5, ... 4.0 and at 0, 2, 4.
    assert_eq!(backend.calls(Endpoint::Latest), 9);
    assert_eq!(backend.calls(Endpoint::SystemStatus), 3);
    dashboard.shutdown().await;
}
