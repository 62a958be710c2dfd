use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which counting pipelines are enabled on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingConfig {
    #[serde(default)]
    pub multiview_enabled: bool,
    #[serde(default)]
    pub singleview_enabled: bool,
    #[serde(default)]
    pub multiview_url: String,
    #[serde(default)]
    pub singleview_url: String,
}

/// Payload of `GET /counting/config` and of the `PUT` on the same path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingConfigResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub config: CountingConfig,
    #[serde(default)]
    pub message: Option<String>,
}

/// Partial update body for `PUT /counting/config`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiview_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singleview_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singleview_url: Option<String>,
}

impl CountingConfigPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.multiview_enabled.is_none()
            && self.singleview_enabled.is_none()
            && self.multiview_url.is_none()
            && self.singleview_url.is_none()
    }
}

/// Counting-service alert (auto fallback, service error...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountingAlert {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub details: Value,
}

/// Payload of `GET /counting/alerts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountingAlerts {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub alerts: Vec<CountingAlert>,
}

/// Body of `POST /counting/alerts/acknowledge`. `None` acknowledges every
/// unacknowledged alert on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcknowledgeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub acknowledged_count: u64,
}
