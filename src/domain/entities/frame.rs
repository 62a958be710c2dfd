use serde::{Deserialize, Serialize};

/// Latest counting frame published by the backend (`GET /latest`).
///
/// `CamPtz` and `CamStream` are indexed by `camera_id - 1`; their length
/// defines how many cameras the deployment currently reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestFrame {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Count")]
    pub count: f64,
    #[serde(rename = "Confidence", default)]
    pub confidence: f64,
    #[serde(rename = "CamPtz", default)]
    pub cam_ptz: Vec<bool>,
    #[serde(rename = "CamStream", default)]
    pub cam_stream: Vec<bool>,
    /// Base64 density map. Opaque to this crate.
    #[serde(rename = "Image", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LatestFrame {
    /// Number of cameras reported by this frame.
    #[must_use]
    pub fn camera_count(&self) -> usize {
        self.cam_ptz.len().max(self.cam_stream.len())
    }

    /// A missing stream flag counts as offline.
    #[must_use]
    pub fn stream_online(&self, index: usize) -> bool {
        self.cam_stream.get(index).copied().unwrap_or(false)
    }

    /// A missing PTZ flag counts as aligned.
    #[must_use]
    pub fn ptz_offset(&self, index: usize) -> bool {
        self.cam_ptz.get(index).copied().unwrap_or(false)
    }
}
