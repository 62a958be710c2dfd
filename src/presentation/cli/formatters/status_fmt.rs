use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};

use crate::application::services::SnapshotMeta;
use crate::domain::rules::camera::{CameraReading, StatusTally};
use crate::domain::rules::health::{or_dash, HealthSummary};
use crate::domain::rules::streams::StreamOverview;
use crate::domain::value_objects::{CameraStatus, ServiceStatus};

#[must_use]
pub fn progress_bar(value: f64, width: usize) -> String {
    let ratio = (value / 100.0).clamp(0.0, 1.0);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let bar_filled = "█".repeat(filled);
    let bar_empty = "░".repeat(empty);

    // Higher is healthier here.
    let colored_bar = if value < 50.0 {
        bar_filled.red().bold()
    } else if value < 90.0 {
        bar_filled.yellow()
    } else {
        bar_filled.green()
    };

    format!("{colored_bar}{bar_empty}")
}

/// Share of `part` in `total` as a percentage. An empty total reads as 0 %.
#[must_use]
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = part as f64 / total as f64;
    ratio * 100.0
}

#[must_use]
pub fn status_badge(status: CameraStatus) -> ColoredString {
    let label = format!(" {} ", status.label());
    match status {
        CameraStatus::Normal => label.on_green().black(),
        CameraStatus::PtzOffset => label.on_red().white().bold(),
        CameraStatus::Offline => label.on_bright_black().white(),
        CameraStatus::RainAffected => label.on_yellow().black(),
    }
}

#[must_use]
pub fn colorize_service(status: ServiceStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        ServiceStatus::Healthy => text.green(),
        ServiceStatus::Unhealthy => text.yellow(),
        ServiceStatus::Error => text.red().bold(),
        ServiceStatus::Unknown => text.dimmed(),
    }
}

fn yes_no(value: Option<bool>) -> ColoredString {
    match value {
        Some(true) => "yes".green(),
        Some(false) => "no".red(),
        None => "-".dimmed(),
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// One-line state of a source: fresh, stale, failed or loading.
#[must_use]
pub fn source_line(meta: &SnapshotMeta) -> String {
    let at = meta
        .last_fetched_at
        .map_or_else(|| "--:--:--".to_string(), format_time);
    let state = match (&meta.error, meta.has_data) {
        (None, true) => "ok".green(),
        (Some(e), true) => format!("stale ({e})").yellow(),
        (Some(e), false) => e.clone().red(),
        (None, false) if meta.loading => "loading".dimmed(),
        (None, false) => "-".dimmed(),
    };
    format!("  {:<18} {at}  {state}", meta.source.as_str())
}

pub fn print_section_header(title: &str) {
    println!("{}", title.bold().cyan());
    let display_width = title.chars().count();
    println!("{}", "─".repeat(display_width).cyan());
}

pub fn print_cameras(readings: &[CameraReading], expected: usize) {
    print_section_header(&format!("\nCameras ({})", readings.len().max(expected)));
    if readings.is_empty() {
        println!("  {}", "No frame yet".dimmed());
        return;
    }
    for chunk in readings.chunks(4) {
        let row: Vec<String> = chunk
            .iter()
            .map(|r| format!("{:>3} {}", r.id, status_badge(r.status)))
            .collect();
        println!("  {}", row.join("  "));
    }

    let tally = StatusTally::from_readings(readings);
    let legend: Vec<String> = CameraStatus::ALL
        .iter()
        .map(|s| format!("{}: {}", s.label(), tally.get(*s)))
        .collect();
    println!("  {}", legend.join(" | ").dimmed());
}

pub fn print_health(summary: &HealthSummary) {
    print_section_header("\nHealth");
    println!(
        "  Algorithm: {}  services {} {}",
        colorize_service(summary.overall_algorithm_status),
        progress_bar(
            percent(summary.healthy_service_count, summary.total_service_count),
            10
        ),
        summary.services_label()
    );
    println!(
        "  System reliable: {}  unreliable cameras: {}",
        yes_no(summary.system_reliable),
        or_dash(summary.unreliable_camera_count)
    );
    println!(
        "  Multiview: {}  Singleview: {}",
        yes_no(summary.multiview_enabled),
        yes_no(summary.singleview_enabled)
    );
}

pub fn print_streams(overview: Option<&StreamOverview>) {
    print_section_header("\nStreams");
    let Some(view) = overview else {
        println!("  {}", "-".dimmed());
        return;
    };
    println!(
        "  {} active / {} total, {} inactive, {} disconnections",
        view.active_streams.to_string().green(),
        view.total_streams,
        view.inactive_streams.to_string().red(),
        view.total_disconnections
    );
    if !view.unhealthy.is_empty() {
        println!("  Unhealthy: {}", view.unhealthy.join(", ").yellow());
    }
}

pub fn print_sources(metas: &[SnapshotMeta]) {
    print_section_header("\nSources");
    for meta in metas {
        println!("{}", source_line(meta));
    }
}
