use serde::{Deserialize, Serialize};

use super::frame::LatestFrame;

/// Rows fetched when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Query of `GET /history`. Time bounds are ISO-8601 strings passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            start_time: None,
            end_time: None,
        }
    }
}

impl HistoryQuery {
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn between(start: impl Into<String>, end: impl Into<String>, limit: u32) -> Self {
        Self {
            limit,
            start_time: Some(start.into()),
            end_time: Some(end.into()),
        }
    }
}

/// Past counting frames, newest first as the backend orders them.
///
/// The backend answers either with a bare array or with `{count, data}`;
/// both decode to this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HistoryPayload")]
pub struct HistoryData {
    pub data: Vec<LatestFrame>,
    pub count: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryPayload {
    Frames(Vec<LatestFrame>),
    Wrapped {
        #[serde(default)]
        data: Vec<LatestFrame>,
        #[serde(default)]
        count: Option<usize>,
    },
}

impl From<HistoryPayload> for HistoryData {
    fn from(payload: HistoryPayload) -> Self {
        match payload {
            HistoryPayload::Frames(data) => Self {
                count: data.len(),
                data,
            },
            HistoryPayload::Wrapped { data, count } => Self {
                count: count.unwrap_or(data.len()),
                data,
            },
        }
    }
}

/// Spread of the counts in a history window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl HistoryData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Min, max and mean count. `None` for an empty window.
    #[must_use]
    pub fn count_range(&self) -> Option<CountRange> {
        let first = self.data.first()?.count;
        let (min, max, sum) = self.data.iter().fold((first, first, 0.0), |(lo, hi, sum), f| {
            (lo.min(f.count), hi.max(f.count), sum + f.count)
        });
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / self.data.len() as f64;
        Some(CountRange { min, max, mean })
    }
}
