#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crowdwatch::application::config::AppConfig;
use crowdwatch::application::services::Dashboard;
use crowdwatch::domain::entities::{
    AlgorithmHealth, CountingConfigPatch, CountingConfigResponse, DeliveryStats, HealthCheck,
    HistoryData, HistoryQuery, LatestFrame, ReliabilityConfigPatch, ReliabilityConfigResponse,
    ReliabilityStatus, StreamHealth, StreamStats,
};
use crowdwatch::domain::ports::backend::FetchError;
use crowdwatch::domain::rules::camera::{CameraFilter, StatusTally};
use crowdwatch::domain::rules::health::HealthSummary;
use crowdwatch::domain::value_objects::{CameraStatus, ServiceStatus, SourceId};
use crowdwatch::infrastructure::backend::in_memory::{Endpoint, InMemoryBackend};
use crowdwatch::presentation::cli::commands::history::HistoryReport;
use crowdwatch::presentation::cli::commands::stats::StatsReport;
use crowdwatch::presentation::cli::commands::status::StatusReport;

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

fn full_backend() -> Arc<InMemoryBackend> {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_latest(Ok(load_fixture::<LatestFrame>("latest.json")));
    backend.set_reliability(Ok(load_fixture::<ReliabilityStatus>(
        "reliability_status.json",
    )));
    backend.set_algorithm_health(Ok(load_fixture::<AlgorithmHealth>(
        "algorithm_health.json",
    )));
    backend.set_counting_config(Ok(load_fixture::<CountingConfigResponse>(
        "counting_config.json",
    )));
    backend.set_stream_health(Ok(load_fixture::<StreamHealth>("stream_health.json")));
    backend
}

// ---------------------------------------------------------------------------
// Camera classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cameras_are_classified_from_frame_and_reliability() {
    let backend = full_backend();
    let dashboard = Dashboard::new(backend, &AppConfig::default());
    dashboard.refresh_once().await;

    let statuses: Vec<CameraStatus> = dashboard
        .camera_statuses()
        .iter()
        .map(|r| r.status)
        .collect();
    // Camera 2 is both PTZ offset and rain affected; PTZ wins.
    // Camera 5 has no reliability entry and stays normal.
    assert_eq!(
        statuses,
        vec![
            CameraStatus::Normal,
            CameraStatus::PtzOffset,
            CameraStatus::Offline,
            CameraStatus::RainAffected,
            CameraStatus::Normal,
        ]
    );
    assert_eq!(
        StatusTally::from_readings(&dashboard.camera_statuses()),
        StatusTally {
            normal: 2,
            ptz_offset: 1,
            offline: 1,
            rain_affected: 1,
        }
    );
    assert_eq!(dashboard.camera_count(), 5);
}

#[tokio::test]
async fn cameras_without_reliability_are_never_rain_affected() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_latest(Ok(load_fixture::<LatestFrame>("latest.json")));
    backend.set_reliability(Err(FetchError::Network("unreachable".into())));
    let dashboard = Dashboard::new(backend, &AppConfig::default());
    dashboard.refresh_once().await;

    let readings = dashboard.camera_statuses();
    assert_eq!(readings.len(), 5);
    assert!(readings
        .iter()
        .all(|r| r.status != CameraStatus::RainAffected));
}

// ---------------------------------------------------------------------------
// Health summary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_health_summary() {
    let dashboard = Dashboard::new(full_backend(), &AppConfig::default());
    dashboard.refresh_once().await;

    assert_eq!(
        dashboard.health(),
        HealthSummary {
            system_reliable: Some(false),
            unreliable_camera_count: Some(2),
            overall_algorithm_status: ServiceStatus::Unhealthy,
            healthy_service_count: 2,
            total_service_count: 3,
            multiview_enabled: Some(true),
            singleview_enabled: Some(false),
        }
    );
}

#[tokio::test]
async fn health_with_only_algorithm_source() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_algorithm_health(Ok(load_fixture::<AlgorithmHealth>(
        "algorithm_health.json",
    )));
    backend.set_reliability(Err(FetchError::Network("unreachable".into())));
    let dashboard = Dashboard::new(backend, &AppConfig::default());
    dashboard.refresh_once().await;

    let health = dashboard.health();
    assert_eq!(health.services_label(), "2/3");
    assert_eq!(health.overall_algorithm_status, ServiceStatus::Unhealthy);
    assert_eq!(health.system_reliable, None);
    assert_eq!(health.unreliable_camera_count, None);
    assert_eq!(health.multiview_enabled, None);
    assert_eq!(health.singleview_enabled, None);
}

#[tokio::test]
async fn health_defaults_to_expected_service_count() {
    let mut config = AppConfig::default();
    config.cameras.expected_services = 4;
    let dashboard = Dashboard::new(Arc::new(InMemoryBackend::new()), &config);
    dashboard.refresh_once().await;

    assert_eq!(dashboard.health().services_label(), "0/4");
}

#[tokio::test]
async fn health_watch_sees_updates() {
    let dashboard = Dashboard::new(full_backend(), &AppConfig::default());
    let mut rx = dashboard.health_aggregator().watch();
    assert_eq!(rx.borrow().system_reliable, None);

    dashboard.refresh_once().await;
    assert!(rx.has_changed().expect("sender alive"));
    assert_eq!(rx.borrow_and_update().system_reliable, Some(false));
}

// ---------------------------------------------------------------------------
// Streams and config update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_overview_from_fixture() {
    let dashboard = Dashboard::new(full_backend(), &AppConfig::default());
    assert!(dashboard.stream_overview().is_none());
    dashboard.refresh_once().await;

    let overview = dashboard.stream_overview().expect("overview");
    assert_eq!(overview.total_streams, 3);
    assert_eq!(overview.active_streams, 2);
    assert_eq!(overview.total_disconnections, 4);
    assert_eq!(overview.unhealthy, vec!["camera_3".to_string()]);
}

#[tokio::test]
async fn config_update_feeds_health() {
    let backend = full_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());
    dashboard.refresh_once().await;
    assert_eq!(dashboard.health().singleview_enabled, Some(false));

    let patch = CountingConfigPatch {
        singleview_enabled: Some(true),
        ..CountingConfigPatch::default()
    };
    dashboard
        .update_counting_config(&patch)
        .await
        .expect("update");

    assert_eq!(dashboard.health().singleview_enabled, Some(true));
    assert_eq!(dashboard.health().multiview_enabled, Some(true));
    assert_eq!(backend.calls(Endpoint::UpdateCountingConfig), 1);
}

// ---------------------------------------------------------------------------
// Observation guards and status report
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn observe_starts_and_last_drop_stops() {
    let backend = full_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());

    let guard = dashboard.observe(SourceId::Latest);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(backend.calls(Endpoint::Latest), 1);

    let second = dashboard.observe(SourceId::Latest);
    drop(guard);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(backend.calls(Endpoint::Latest), 2);

    drop(second);
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(backend.calls(Endpoint::Latest), 2);
    assert!(dashboard.scheduler().running().is_empty());
}

#[tokio::test]
async fn status_report_combines_sources() {
    let dashboard = Dashboard::new(full_backend(), &AppConfig::default());
    dashboard.refresh_once().await;

    let report = StatusReport::collect(&dashboard, CameraFilter::Online);
    assert_eq!(report.count, Some(137.0));
    assert_eq!(report.cameras.len(), 4);
    assert_eq!(report.umbrella_total, Some(29));
    assert_eq!(report.camera_threshold, Some(5.0));
    assert_eq!(report.system_threshold, Some(10.0));
    assert_eq!(report.streams.map(|s| s.inactive_streams), Some(1));
    assert!(report.system.is_none());
}

// ---------------------------------------------------------------------------
// On-demand sources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reliability_update_round_trip() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_reliability_config(Ok(load_fixture::<ReliabilityConfigResponse>(
        "reliability_config.json",
    )));
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());

    dashboard
        .load(SourceId::ReliabilityConfig)
        .await
        .expect("load");
    let patch = ReliabilityConfigPatch {
        camera_threshold: Some(3.0),
        system_threshold: None,
    };
    let response = dashboard
        .update_reliability_config(&patch)
        .await
        .expect("update");
    assert!((response.config.camera_threshold - 3.0).abs() < f64::EPSILON);
    assert!((response.config.system_threshold - 10.0).abs() < f64::EPSILON);

    let snapshot = dashboard.store().reliability_config().get();
    assert_eq!(snapshot.data().map(|r| r.config), Some(response.config));
    assert_eq!(backend.calls(Endpoint::UpdateReliabilityConfig), 1);
}

#[tokio::test]
async fn history_window_from_fixture() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_history(Ok(load_fixture::<HistoryData>("history.json")));
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());

    let query = HistoryQuery::between("2025-06-01T08:00:00", "2025-06-01T09:00:00", 2);
    dashboard.load_history(query.clone()).await.expect("history");
    assert_eq!(backend.last_history_query(), Some(query));

    let report = HistoryReport::collect(&dashboard).expect("report");
    assert_eq!(report.count, 120);
    assert_eq!(report.frames.len(), 2);
    assert_eq!(report.frames[0].timestamp, "2025-06-01T08:00:03");
    let range = report.range.expect("range");
    assert!((range.min - 138.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn empty_history_keeps_previous_window() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_history(Ok(load_fixture::<HistoryData>("history.json")));
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());
    dashboard
        .load_history(HistoryQuery::default())
        .await
        .expect("history");

    backend.set_history(Err(FetchError::NotFound));
    assert!(dashboard
        .load_history(HistoryQuery::with_limit(10))
        .await
        .is_err());
    let meta = dashboard.meta(SourceId::History);
    assert!(meta.stale);
    assert_eq!(meta.error.as_deref(), Some("No historical data available"));
    assert_eq!(
        HistoryReport::collect(&dashboard).map(|r| r.frames.len()),
        Some(3)
    );
}

#[tokio::test]
async fn stats_sources_from_fixtures() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.set_stats(Ok(load_fixture::<DeliveryStats>("stats.json")));
    backend.set_stream_stats(Ok(load_fixture::<StreamStats>("stream_stats.json")));
    backend.set_health_check(Ok(HealthCheck {
        status: "healthy".into(),
        timestamp: None,
    }));
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());

    for source in [SourceId::Stats, SourceId::HealthCheck, SourceId::StreamStats] {
        dashboard.load(source).await.expect("load");
    }
    let report = StatsReport::collect(&dashboard);
    assert_eq!(report.delivery.map(|d| d.total_failed), Some(12));
    assert!(report.health.is_some_and(|h| h.is_healthy()));
    let streams = report.streams.expect("stream stats");
    assert_eq!(streams.stats.total_frames_recorded, 86_400);
    assert!(streams.stats.extra.contains_key("uptime_seconds"));
    assert!(report.sources.iter().all(|m| m.error.is_none()));
}

#[tokio::test(start_paused = true)]
async fn start_all_leaves_on_demand_sources_idle() {
    let backend = full_backend();
    let dashboard = Dashboard::new(backend.clone(), &AppConfig::default());
    dashboard.start_all();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(backend.calls(Endpoint::Latest), 1);
    assert_eq!(backend.calls(Endpoint::History), 0);
    assert_eq!(backend.calls(Endpoint::Stats), 0);
    assert_eq!(dashboard.scheduler().running().len(), SourceId::POLLED.len());
    dashboard.shutdown().await;
}
