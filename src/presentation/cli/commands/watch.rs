use std::time::Duration;

use crate::application::services::Dashboard;
use crate::domain::rules::camera::CameraFilter;

use super::status::{print_report, StatusReport};

/// Poll every source in the background and print the dashboard every
/// `interval_secs` seconds.
///
/// Runs until SIGINT (Ctrl+C) via [`tokio::signal::ctrl_c()`], then stops all
/// source loops and waits for them to wind down. SIGTERM is not handled.
///
/// # Errors
///
/// Never fails today; the `Result` keeps the command signatures uniform.
pub async fn run_watch(dashboard: &Dashboard, interval_secs: u64) -> anyhow::Result<()> {
    tracing::info!(interval_secs, "watch started");
    dashboard.start_all();

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires at once, before any fetch settled.
    interval.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = StatusReport::collect(dashboard, CameraFilter::All);
                print_report(&report);
            }
            _ = &mut shutdown => {
                tracing::info!("interrupt received, stopping source loops");
                println!("\nStopping crowdwatch...");
                break;
            }
        }
    }

    dashboard.shutdown().await;
    Ok(())
}
