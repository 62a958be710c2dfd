use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health of a single recorded stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStatus {
    #[serde(default)]
    pub is_healthy: bool,
    #[serde(default)]
    pub last_frame_time: Option<f64>,
    #[serde(default)]
    pub stream_name: Option<String>,
    #[serde(default)]
    pub disconnected_at: Option<String>,
    #[serde(default)]
    pub reconnected_at: Option<String>,
    #[serde(default)]
    pub total_disconnections: u64,
    #[serde(default)]
    pub total_frames: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSummary {
    #[serde(default)]
    pub total_streams: u32,
    #[serde(default)]
    pub active_streams: u32,
    #[serde(default)]
    pub inactive_streams: u32,
    #[serde(default)]
    pub total_disconnections: u64,
}

/// Payload of `GET /stream/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamHealth {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub summary: Option<StreamSummary>,
    #[serde(default)]
    pub active: Vec<String>,
    #[serde(default)]
    pub inactive: Vec<String>,
    #[serde(default)]
    pub streams: BTreeMap<String, StreamStatus>,
}

/// Kind of stream alert raised by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamAlertType {
    Disconnected,
    Reconnected,
    HighLatency,
    #[serde(other)]
    Other,
}

impl StreamAlertType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Reconnected => "reconnected",
            Self::HighLatency => "high_latency",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for StreamAlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StreamAlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disconnected" => Ok(Self::Disconnected),
            "reconnected" => Ok(Self::Reconnected),
            "high_latency" | "high-latency" => Ok(Self::HighLatency),
            other => Err(format!(
                "unknown stream alert type '{other}' (expected disconnected, reconnected, high_latency)"
            )),
        }
    }
}

/// Read-only stream alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamAlert {
    pub stream_name: String,
    pub alert_type: StreamAlertType,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub details: Value,
}

/// Payload of `GET /stream/alerts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamAlerts {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub alerts: Vec<StreamAlert>,
}

/// Recorder-wide counters. Fields the recorder adds later are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamCounters {
    #[serde(default)]
    pub total_streams: u32,
    #[serde(default)]
    pub total_frames_recorded: u64,
    #[serde(default)]
    pub total_disconnections: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Payload of `GET /stream/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStats {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub stats: StreamCounters,
}
