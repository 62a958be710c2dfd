use anyhow::Context;
use colored::Colorize;

use crate::application::services::{AlertFilter, Dashboard};
use crate::domain::entities::StreamAlertType;
use crate::domain::value_objects::SourceId;
use crate::presentation::cli::formatters::alert_fmt::{
    format_counting_alerts, format_stream_alerts, print_no_alerts,
};
use crate::presentation::cli::formatters::status_fmt::{print_section_header, print_streams};

/// List counting alerts.
///
/// # Errors
///
/// Returns an error if the alert endpoint fails.
pub async fn run_alerts(dashboard: &Dashboard, unacknowledged_only: bool) -> anyhow::Result<()> {
    let coordinator = dashboard.alerts();
    let count = coordinator
        .refresh(AlertFilter {
            unacknowledged_only,
        })
        .await
        .context("cannot fetch counting alerts")?;

    if count == 0 {
        print_no_alerts();
        return Ok(());
    }
    let alerts = coordinator.alerts();
    print_section_header(&format!(
        "Counting alerts ({} open / {})",
        coordinator.unacknowledged_count(),
        alerts.len()
    ));
    format_counting_alerts(&alerts, &coordinator.selected());
    Ok(())
}

/// Acknowledge `ids`, or every unacknowledged alert with `all`.
///
/// # Errors
///
/// Returns an error if neither ids nor `--all` were given, or if the
/// acknowledge call fails.
pub async fn run_ack(dashboard: &Dashboard, ids: Vec<String>, all: bool) -> anyhow::Result<()> {
    if ids.is_empty() && !all {
        anyhow::bail!("nothing to acknowledge: pass alert ids or --all");
    }
    let coordinator = dashboard.alerts();
    let acknowledged = if all {
        coordinator.acknowledge(None).await
    } else {
        coordinator.set_selection(ids);
        coordinator.acknowledge_selected().await
    }
    .context("acknowledge failed")?;

    println!(
        "{} {acknowledged} alert(s) acknowledged, {} still open",
        "✓".green().bold(),
        coordinator.unacknowledged_count()
    );
    Ok(())
}

/// List stream alerts together with the stream overview.
///
/// # Errors
///
/// Returns an error if the stream alert endpoint fails. A failing stream
/// health endpoint only hides the overview.
pub async fn run_streams(
    dashboard: &Dashboard,
    alert_type: Option<StreamAlertType>,
) -> anyhow::Result<()> {
    if let Err(e) = dashboard.load(SourceId::StreamHealth).await {
        tracing::debug!(error = %e, "stream overview unavailable");
    }
    let coordinator = dashboard.alerts();
    let alert_type = alert_type.or_else(|| coordinator.stream_type());
    coordinator
        .refresh_stream(alert_type)
        .await
        .context("cannot fetch stream alerts")?;

    print_streams(dashboard.stream_overview().as_ref());
    let alerts = coordinator.stream_alerts();
    if alerts.is_empty() {
        print_no_alerts();
        return Ok(());
    }
    print_section_header(&format!("\nStream alerts ({})", alerts.len()));
    format_stream_alerts(&alerts);
    println!();
    Ok(())
}
