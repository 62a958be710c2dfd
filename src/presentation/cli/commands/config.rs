use std::path::Path;

use colored::Colorize;

use crate::application::config::AppConfig;

/// Print where the configuration was loaded from and its effective TOML.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn run_config(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    println!("{} {}", "Config file:".bold(), path.display());
    println!("{}", "─".repeat(40).dimmed());
    print!("{}", config.to_toml()?);
    Ok(())
}
