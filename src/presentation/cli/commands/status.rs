use colored::Colorize;
use serde::Serialize;

use crate::application::services::{Dashboard, SnapshotMeta};
use crate::domain::entities::SystemStatus;
use crate::domain::rules::camera::{total_umbrella_count, CameraFilter, CameraReading, StatusTally};
use crate::domain::rules::health::{or_dash, HealthSummary};
use crate::domain::rules::streams::StreamOverview;
use crate::domain::value_objects::SourceId;
use crate::presentation::cli::formatters::status_fmt::{
    print_cameras, print_health, print_section_header, print_sources, print_streams,
};

/// Everything the status view shows, read from the store at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub count: Option<f64>,
    pub confidence: Option<f64>,
    pub timestamp: Option<String>,
    pub camera_count: usize,
    pub cameras: Vec<CameraReading>,
    pub tally: StatusTally,
    pub umbrella_total: Option<u64>,
    pub camera_threshold: Option<f64>,
    pub system_threshold: Option<f64>,
    pub health: HealthSummary,
    pub streams: Option<StreamOverview>,
    pub system: Option<SystemStatus>,
    pub sources: Vec<SnapshotMeta>,
}

impl StatusReport {
    #[must_use]
    pub fn collect(dashboard: &Dashboard, filter: CameraFilter) -> Self {
        let store = dashboard.store();
        let latest = store.latest().get();
        let frame = latest.data();
        let reliability = store.reliability_status().get();
        let report = reliability.data().and_then(|r| r.reliability.as_ref());
        let system = store.system_status().get();

        let all = dashboard.camera_statuses();
        Self {
            count: frame.map(|f| f.count),
            confidence: frame.map(|f| f.confidence),
            timestamp: frame.map(|f| f.timestamp.clone()),
            camera_count: dashboard.camera_count(),
            tally: StatusTally::from_readings(&all),
            cameras: filter.apply(&all),
            umbrella_total: report.map(|r| total_umbrella_count(&r.cameras)),
            camera_threshold: report.and_then(|r| r.camera_threshold),
            system_threshold: report.and_then(|r| r.system_threshold),
            health: dashboard.health(),
            streams: dashboard.stream_overview(),
            system: system.data().map(|s| SystemStatus::clone(s)),
            sources: SourceId::POLLED.iter().map(|id| dashboard.meta(*id)).collect(),
        }
    }
}

/// Print a report in the terminal layout shared by `status` and `watch`.
pub fn print_report(report: &StatusReport) {
    println!("{}", "crowdwatch — Counting Status".bold().cyan());
    println!("{}", "━".repeat(50));

    print_section_header("\nCount");
    match report.count {
        Some(count) => println!(
            "  {} people  (confidence {:.2})  {}",
            format!("{count:.0}").bold(),
            report.confidence.unwrap_or_default(),
            report.timestamp.as_deref().unwrap_or("").dimmed()
        ),
        None => println!("  {}", "-".dimmed()),
    }

    print_cameras(&report.cameras, report.camera_count);
    println!(
        "  Umbrellas: {}  thresholds camera/system: {}/{}",
        or_dash(report.umbrella_total),
        or_dash(report.camera_threshold),
        or_dash(report.system_threshold)
    );
    print_health(&report.health);
    print_streams(report.streams.as_ref());

    if let Some(system) = &report.system {
        print_section_header("\nSender");
        let stats = system.stats.clone().unwrap_or_default();
        println!(
            "  {}  sent {} ({} ok, {} failed)  history {}",
            system.status,
            stats.total_sent,
            stats.total_success.to_string().green(),
            stats.total_failed.to_string().red(),
            system.history_count
        );
    }

    print_sources(&report.sources);
    println!();
}

/// Fetch every source once and print the result.
///
/// # Errors
///
/// Returns an error if JSON serialization fails. Source failures are part of
/// the report, not errors.
pub async fn run_status(
    dashboard: &Dashboard,
    filter: CameraFilter,
    json: bool,
) -> anyhow::Result<()> {
    dashboard.refresh_once().await;
    let report = StatusReport::collect(dashboard, filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&report);
    Ok(())
}
