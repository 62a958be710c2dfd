use serde::{Deserialize, Serialize};

/// Identifier of a backend source with its own snapshot.
///
/// The live sources in [`SourceId::POLLED`] make up the dashboard and are
/// polled together. The [`SourceId::ON_DEMAND`] ones are loaded when a view
/// asks for them, or polled while observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceId {
    Latest,
    ReliabilityStatus,
    StreamHealth,
    AlgorithmHealth,
    CountingConfig,
    CountingAlerts,
    StreamAlerts,
    SystemStatus,
    ReliabilityConfig,
    History,
    Stats,
    HealthCheck,
    StreamStats,
}

impl SourceId {
    pub const POLLED: [Self; 8] = [
        Self::Latest,
        Self::ReliabilityStatus,
        Self::StreamHealth,
        Self::AlgorithmHealth,
        Self::CountingConfig,
        Self::CountingAlerts,
        Self::StreamAlerts,
        Self::SystemStatus,
    ];

    pub const ON_DEMAND: [Self; 5] = [
        Self::ReliabilityConfig,
        Self::History,
        Self::Stats,
        Self::HealthCheck,
        Self::StreamStats,
    ];

    pub const ALL: [Self; 13] = [
        Self::Latest,
        Self::ReliabilityStatus,
        Self::StreamHealth,
        Self::AlgorithmHealth,
        Self::CountingConfig,
        Self::CountingAlerts,
        Self::StreamAlerts,
        Self::SystemStatus,
        Self::ReliabilityConfig,
        Self::History,
        Self::Stats,
        Self::HealthCheck,
        Self::StreamStats,
    ];

    #[must_use]
    pub const fn is_polled(self) -> bool {
        !matches!(
            self,
            Self::ReliabilityConfig
                | Self::History
                | Self::Stats
                | Self::HealthCheck
                | Self::StreamStats
        )
    }

    /// Operator message for a 404 on this source.
    #[must_use]
    pub const fn not_found_message(self) -> &'static str {
        match self {
            Self::History => "No historical data available",
            _ => "No data available",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::ReliabilityStatus => "reliabilityStatus",
            Self::StreamHealth => "streamHealth",
            Self::AlgorithmHealth => "algorithmHealth",
            Self::CountingConfig => "countingConfig",
            Self::CountingAlerts => "countingAlerts",
            Self::StreamAlerts => "streamAlerts",
            Self::SystemStatus => "systemStatus",
            Self::ReliabilityConfig => "reliabilityConfig",
            Self::History => "history",
            Self::Stats => "stats",
            Self::HealthCheck => "healthCheck",
            Self::StreamStats => "streamStats",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown source '{s}'"))
    }
}
