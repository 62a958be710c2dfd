use anyhow::Context;
use colored::Colorize;

use crate::application::services::Dashboard;
use crate::domain::entities::ReliabilityConfigPatch;
use crate::domain::value_objects::SourceId;
use crate::presentation::cli::formatters::stats_fmt::print_thresholds;

/// Show the reliability thresholds, or update them when `patch` sets any.
///
/// # Errors
///
/// Returns an error if the fetch or the update fails.
pub async fn run_reliability(
    dashboard: &Dashboard,
    patch: ReliabilityConfigPatch,
) -> anyhow::Result<()> {
    let config = if patch.is_empty() {
        dashboard
            .load(SourceId::ReliabilityConfig)
            .await
            .context("cannot fetch reliability config")?;
        dashboard
            .store()
            .reliability_config()
            .get()
            .data()
            .map(|r| r.config)
            .unwrap_or_default()
    } else {
        let response = dashboard
            .update_reliability_config(&patch)
            .await
            .context("reliability config update failed")?;
        println!("{} thresholds updated", "✓".green().bold());
        response.config
    };
    print_thresholds(&config);
    Ok(())
}
