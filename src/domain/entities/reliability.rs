use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-camera rain/umbrella reliability reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraReliability {
    #[serde(default = "default_reliable")]
    pub reliable: bool,
    #[serde(default)]
    pub umbrella_count: u32,
}

impl Default for CameraReliability {
    fn default() -> Self {
        Self {
            reliable: default_reliable(),
            umbrella_count: 0,
        }
    }
}

const fn default_reliable() -> bool {
    true
}

/// Reliability block of `GET /reliability/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityReport {
    #[serde(default)]
    pub system_reliable: Option<bool>,
    #[serde(default)]
    pub unreliable_camera_count: Option<u32>,
    #[serde(default)]
    pub camera_threshold: Option<f64>,
    #[serde(default)]
    pub system_threshold: Option<f64>,
    /// Keyed by `camera_<id>`.
    #[serde(default)]
    pub cameras: BTreeMap<String, CameraReliability>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub reliability: Option<ReliabilityReport>,
}

impl ReliabilityStatus {
    #[must_use]
    pub fn cameras(&self) -> Option<&BTreeMap<String, CameraReliability>> {
        self.reliability.as_ref().map(|r| &r.cameras)
    }
}

/// Umbrella thresholds behind the reliability verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default)]
    pub camera_threshold: f64,
    #[serde(default)]
    pub system_threshold: f64,
}

/// Payload of `GET /reliability/config` and of the `PUT` on the same path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityConfigResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub config: ReliabilityConfig,
    #[serde(default)]
    pub message: Option<String>,
}

/// Partial update body for `PUT /reliability/config`. Unset fields are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_threshold: Option<f64>,
}

impl ReliabilityConfigPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.camera_threshold.is_none() && self.system_threshold.is_none()
    }

    /// Overwrite the fields of `config` that this patch sets.
    pub fn apply_to(&self, config: &mut ReliabilityConfig) {
        if let Some(v) = self.camera_threshold {
            config.camera_threshold = v;
        }
        if let Some(v) = self.system_threshold {
            config.system_threshold = v;
        }
    }
}
