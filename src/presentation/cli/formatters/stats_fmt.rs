use colored::Colorize;

use crate::domain::entities::{DeliveryStats, HealthCheck, ReliabilityConfig, StreamStats};
use crate::presentation::cli::formatters::status_fmt::{print_section_header, progress_bar};

#[must_use]
pub fn delivery_line(stats: &DeliveryStats) -> String {
    format!(
        "  sent {} ({} ok, {} failed)  success {:.1}%",
        stats.total_sent, stats.total_success, stats.total_failed, stats.success_rate
    )
}

pub fn print_delivery(stats: Option<&DeliveryStats>) {
    print_section_header("\nDelivery");
    let Some(stats) = stats else {
        println!("  {}", "-".dimmed());
        return;
    };
    println!("{}", delivery_line(stats));
    println!("  {}", progress_bar(stats.success_rate, 30));
    if let Some(start) = &stats.start_time {
        println!(
            "  {}",
            format!(
                "since {start}, last update {}",
                stats.last_update.as_deref().unwrap_or("-")
            )
            .dimmed()
        );
    }
}

pub fn print_health_check(check: Option<&HealthCheck>) {
    print_section_header("\nBackend");
    match check {
        Some(check) if check.is_healthy() => println!("  {}", check.status.green()),
        Some(check) => println!("  {}", check.status.red().bold()),
        None => println!("  {}", "unreachable".red()),
    }
}

pub fn print_stream_stats(stats: Option<&StreamStats>) {
    print_section_header("\nRecorder");
    let Some(stats) = stats else {
        println!("  {}", "-".dimmed());
        return;
    };
    let counters = &stats.stats;
    println!(
        "  {} streams, {} frames recorded, {} disconnections",
        counters.total_streams, counters.total_frames_recorded, counters.total_disconnections
    );
}

#[must_use]
pub fn thresholds_line(config: &ReliabilityConfig) -> String {
    format!(
        "  camera threshold {}  system threshold {}",
        config.camera_threshold, config.system_threshold
    )
}

pub fn print_thresholds(config: &ReliabilityConfig) {
    print_section_header("Reliability thresholds");
    println!("{}", thresholds_line(config));
}
