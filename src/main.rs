use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crowdwatch::application::config::AppConfig;
use crowdwatch::application::services::Dashboard;
use crowdwatch::domain::entities::{HistoryQuery, ReliabilityConfigPatch};
use crowdwatch::infrastructure::backend::HttpBackend;
use crowdwatch::presentation::cli::app::{Cli, Commands};
use crowdwatch::presentation::cli::commands::alerts::{run_ack, run_alerts, run_streams};
use crowdwatch::presentation::cli::commands::config::run_config;
use crowdwatch::presentation::cli::commands::history::run_history;
use crowdwatch::presentation::cli::commands::reliability::run_reliability;
use crowdwatch::presentation::cli::commands::stats::run_stats;
use crowdwatch::presentation::cli::commands::status::run_status;
use crowdwatch::presentation::cli::commands::watch::run_watch;

const DEFAULT_WATCH_SECS: u64 = 5;

fn print_banner(base_url: &str) {
    println!("{}", "━".repeat(40).cyan());
    println!("{}", "  CROWDWATCH — Counting Dashboard".bold().cyan());
    println!("  {}", base_url.dimmed());
    println!("{}", "━".repeat(40).cyan());
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(ref path) => path.clone(),
        None => AppConfig::config_path()?,
    };
    let config = if cli.config.is_some() {
        AppConfig::load_from(&config_path)?
    } else {
        AppConfig::load_or_create(&config_path)?
    };

    if let Some(Commands::Config) = cli.command {
        return run_config(&config, &config_path);
    }

    // Manual DI: main.rs is the only place that knows concrete types
    let backend = HttpBackend::new(&config.backend).context("cannot create backend client")?;
    let dashboard = Dashboard::new(Arc::new(backend), &config);

    match cli.command {
        Some(Commands::Status { json, filter }) => {
            run_status(&dashboard, filter, json).await?;
        }
        Some(Commands::Alerts { unacknowledged }) => {
            run_alerts(&dashboard, unacknowledged).await?;
        }
        Some(Commands::Ack { ids, all }) => {
            run_ack(&dashboard, ids, all).await?;
        }
        Some(Commands::Streams { alert_type }) => {
            run_streams(&dashboard, alert_type).await?;
        }
        Some(Commands::History {
            limit,
            start,
            end,
            json,
        }) => {
            let query = HistoryQuery {
                limit,
                start_time: start,
                end_time: end,
            };
            run_history(&dashboard, query, json).await?;
        }
        Some(Commands::Stats { json }) => {
            run_stats(&dashboard, json).await?;
        }
        Some(Commands::Reliability {
            camera_threshold,
            system_threshold,
        }) => {
            let patch = ReliabilityConfigPatch {
                camera_threshold,
                system_threshold,
            };
            run_reliability(&dashboard, patch).await?;
        }
        Some(Commands::Watch { interval_secs }) => {
            print_banner(&config.backend.base_url);
            run_watch(&dashboard, interval_secs).await?;
        }
        None => {
            print_banner(&config.backend.base_url);
            run_watch(&dashboard, DEFAULT_WATCH_SECS).await?;
        }
        Some(Commands::Config) => {}
    }

    Ok(())
}
