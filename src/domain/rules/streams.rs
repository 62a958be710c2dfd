use serde::Serialize;

use crate::domain::entities::StreamHealth;

/// Condensed view of the recorder's stream health.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamOverview {
    pub total_streams: u32,
    pub active_streams: u32,
    pub inactive_streams: u32,
    pub total_disconnections: u64,
    /// Sorted names of streams reporting `is_healthy == false`.
    pub unhealthy: Vec<String>,
}

/// Derive the overview. Counts come from the `summary` block when present,
/// otherwise from the stream map itself.
#[must_use]
pub fn overview(health: &StreamHealth) -> StreamOverview {
    let unhealthy: Vec<String> = health
        .streams
        .iter()
        .filter(|(_, s)| !s.is_healthy)
        .map(|(name, _)| name.clone())
        .collect();

    if let Some(summary) = &health.summary {
        return StreamOverview {
            total_streams: summary.total_streams,
            active_streams: summary.active_streams,
            inactive_streams: summary.inactive_streams,
            total_disconnections: summary.total_disconnections,
            unhealthy,
        };
    }

    let total = u32::try_from(health.streams.len()).unwrap_or(u32::MAX);
    let inactive = u32::try_from(unhealthy.len()).unwrap_or(u32::MAX);
    StreamOverview {
        total_streams: total,
        active_streams: total.saturating_sub(inactive),
        inactive_streams: inactive,
        total_disconnections: health
            .streams
            .values()
            .map(|s| s.total_disconnections)
            .sum(),
        unhealthy,
    }
}
