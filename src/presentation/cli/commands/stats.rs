use serde::Serialize;

use crate::application::services::{Dashboard, SnapshotMeta};
use crate::domain::entities::{DeliveryStats, HealthCheck, StreamStats};
use crate::domain::value_objects::SourceId;
use crate::presentation::cli::formatters::stats_fmt::{
    print_delivery, print_health_check, print_stream_stats,
};
use crate::presentation::cli::formatters::status_fmt::print_sources;

const SOURCES: [SourceId; 3] = [SourceId::Stats, SourceId::HealthCheck, SourceId::StreamStats];

/// Sender delivery counters, backend liveness and recorder counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub delivery: Option<DeliveryStats>,
    pub health: Option<HealthCheck>,
    pub streams: Option<StreamStats>,
    pub sources: Vec<SnapshotMeta>,
}

impl StatsReport {
    #[must_use]
    pub fn collect(dashboard: &Dashboard) -> Self {
        let store = dashboard.store();
        Self {
            delivery: store.stats().get().data().map(|s| DeliveryStats::clone(s)),
            health: store.health_check().get().data().map(|h| HealthCheck::clone(h)),
            streams: store.stream_stats().get().data().map(|s| StreamStats::clone(s)),
            sources: SOURCES.iter().map(|id| dashboard.meta(*id)).collect(),
        }
    }
}

/// Fetch the three stats sources once and print them.
///
/// # Errors
///
/// Returns an error if JSON serialization fails. Source failures are part of
/// the report.
pub async fn run_stats(dashboard: &Dashboard, json: bool) -> anyhow::Result<()> {
    let (delivery, health, streams) = tokio::join!(
        dashboard.load(SourceId::Stats),
        dashboard.load(SourceId::HealthCheck),
        dashboard.load(SourceId::StreamStats),
    );
    for (source, result) in SOURCES.iter().zip([delivery, health, streams]) {
        if let Err(e) = result {
            tracing::debug!(source = source.as_str(), error = %e, "stats source unavailable");
        }
    }
    let report = StatsReport::collect(dashboard);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_health_check(report.health.as_ref());
    print_delivery(report.delivery.as_ref());
    print_stream_stats(report.streams.as_ref());
    print_sources(&report.sources);
    println!();
    Ok(())
}
