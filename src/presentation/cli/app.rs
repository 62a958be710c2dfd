use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::entities::{StreamAlertType, DEFAULT_HISTORY_LIMIT};
use crate::domain::rules::camera::CameraFilter;

/// crowdwatch: people-counting telemetry dashboard
///
/// Polls the counting backend's independent sources, classifies every
/// camera, and summarizes stream and algorithm health.
#[derive(Parser, Debug)]
#[command(name = "crowdwatch")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll all sources and print the dashboard until Ctrl+C
    #[command(alias = "w")]
    Watch {
        /// Print interval in seconds
        #[arg(short, long, default_value = "5")]
        interval_secs: u64,
    },

    /// Fetch every source once and print the dashboard
    #[command(alias = "s")]
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Camera filter (all, online, offline, ptz-normal, ptz-offset)
        #[arg(short, long, default_value = "all")]
        filter: CameraFilter,
    },

    /// List counting alerts
    #[command(alias = "a")]
    Alerts {
        /// Only unacknowledged alerts
        #[arg(short, long)]
        unacknowledged: bool,
    },

    /// Acknowledge counting alerts
    Ack {
        /// Alert ids to acknowledge
        ids: Vec<String>,

        /// Acknowledge every unacknowledged alert
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },

    /// List stream alerts and the stream overview
    Streams {
        /// Alert type (disconnected, reconnected, high_latency)
        #[arg(short = 't', long = "type")]
        alert_type: Option<StreamAlertType>,
    },

    /// Show past counting frames
    History {
        /// Maximum number of rows
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,

        /// Window start (ISO-8601)
        #[arg(long)]
        start: Option<String>,

        /// Window end (ISO-8601)
        #[arg(long)]
        end: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show sender delivery stats, backend health and recorder counters
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the reliability thresholds, or update them with the flags
    Reliability {
        /// New per-camera umbrella threshold
        #[arg(long)]
        camera_threshold: Option<f64>,

        /// New system-wide umbrella threshold
        #[arg(long)]
        system_threshold: Option<f64>,
    },

    /// Show the effective configuration
    #[command(alias = "c")]
    Config,
}
